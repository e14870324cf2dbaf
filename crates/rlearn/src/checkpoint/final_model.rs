//! Final model location.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the model is written once training ends.
///
/// The file is `{dir}/{name}.{extension}`. Without a name, a unique
/// `final_model_<8 hex digits>` is generated for every run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinalModelConfig {
    pub dir: PathBuf,
    pub name: Option<String>,
    pub extension: String,
}

impl Default for FinalModelConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("final_model"),
            name: None,
            extension: "bin".to_string(),
        }
    }
}

impl FinalModelConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Default::default()
        }
    }

    /// Use a fixed file name instead of a generated one
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Resolve the output path, generating a name if none was configured.
    pub fn resolve<R: Rng>(&self, rng: &mut R) -> PathBuf {
        let suffix = format!(".{}", self.extension);
        let file_name = match &self.name {
            Some(name) if name.ends_with(&suffix) => name.clone(),
            Some(name) => format!("{}{}", name, suffix),
            None => format!("final_model_{:08x}{}", rng.gen::<u32>(), suffix),
        };
        self.dir.join(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_named_path() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(0);
        let config = FinalModelConfig::new("out").with_name("policy");
        assert_eq!(config.resolve(&mut rng), PathBuf::from("out/policy.bin"));

        let config = FinalModelConfig::new("out").with_name("policy.bin");
        assert_eq!(config.resolve(&mut rng), PathBuf::from("out/policy.bin"));
    }

    #[test]
    fn test_generated_name() {
        let mut rng = rand::rngs::StdRng::seed_from_u64(0);
        let config = FinalModelConfig::new("out").with_extension("pt");
        let path = config.resolve(&mut rng);
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("final_model_"));
        assert!(name.ends_with(".pt"));
        assert_eq!(name.len(), "final_model_".len() + 8 + ".pt".len());
        assert_eq!(path.parent().unwrap(), std::path::Path::new("out"));
    }
}
