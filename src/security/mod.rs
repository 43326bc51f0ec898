pub mod classifier;
pub mod normalizer;
pub mod policy;

pub use classifier::{CommandClassifier, PolicyViolation, Verdict};
pub use normalizer::{CanonicalCommand, CommandNormalizer, Normalization};
pub use policy::{DenyCategory, DenyRule, RewriteRule};
