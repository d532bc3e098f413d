pub mod ease;
pub mod parameterization;
