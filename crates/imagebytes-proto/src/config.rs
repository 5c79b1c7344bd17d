//! Codec configuration.

/// How the implicit encoder chooses a wire kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NarrowingPolicy {
    /// Narrowest legal kind by byte width. Within one width the kind matching
    /// the declared kind's signedness wins.
    #[default]
    Narrowest,
    /// Only `Byte` or kinds with the declared kind's signedness. An `Int32`
    /// frame holding `[0, 65535]` stays `Int32` instead of shipping as
    /// `UInt16`.
    PreserveSignedness,
    /// Wire kind equals the declared kind. Skips the value scan.
    Disabled,
}

/// Codec configuration
#[derive(Debug, Clone)]
pub struct CodecConfig {
    /// Wire kind selection for implicit encodes
    pub narrowing: NarrowingPolicy,
    /// Largest payload a decoder accepts before allocating
    pub max_payload_len: usize,
}

impl CodecConfig {
    /// Default decode limit: 1 GiB.
    pub const DEFAULT_MAX_PAYLOAD_LEN: usize = 1 << 30;
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self { narrowing: NarrowingPolicy::default(), max_payload_len: Self::DEFAULT_MAX_PAYLOAD_LEN }
    }
}
