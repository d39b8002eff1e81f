pub type Scalar = f32;
