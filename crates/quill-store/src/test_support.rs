//! Shared test utilities for quill-store tests.
