//! End-to-end tests of the answering pipeline.
