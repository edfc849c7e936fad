/// Tolerance for comparing composed affine transforms against identity
pub const TRANSFORM_TOLERANCE: f32 = 1e-3;
