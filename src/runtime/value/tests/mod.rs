//! Tests for script values
