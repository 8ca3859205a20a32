/// Unwrap a [`ZstdOutcome`](crate::ZstdOutcome) value, returning the value
/// from the [`Complete`](crate::ZstdOutcome::Complete) variant, or
/// propagating the [`HasMore`](crate::ZstdOutcome::HasMore) variant to the
/// caller (wrapped with `Ok(_)`).
macro_rules! complete_ok {
    ($e:expr) => {
        match $e {
            crate::ZstdOutcome::HasMore { remaining_bytes } => {
                return ::std::result::Result::Ok(crate::ZstdOutcome::HasMore { remaining_bytes })
            }
            crate::ZstdOutcome::Complete(value) => value,
        }
    };
}
