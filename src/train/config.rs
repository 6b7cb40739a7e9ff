pub use super::{Error, Gaussian3dTrainable, Gaussian3dTrainer};
pub use burn::config::Config;

/// The configuration of [`Gaussian3dTrainer`].
#[derive(Config, Debug, PartialEq)]
pub struct Gaussian3dTrainerConfig {
    /// Number of optimization steps (`M`).
    #[config(default = 1000)]
    pub iterations: usize,
    /// The learning rate shared by all trainable properties.
    #[config(default = 0.01)]
    pub learning_rate: f64,
    /// A frame is recorded every `frame_stride` iterations (`K`).
    #[config(default = 5)]
    pub frame_stride: usize,
    #[config(default = true)]
    pub is_recording_frames: bool,
    #[config(default = "Gaussian3dTrainable::new()")]
    pub trainable: Gaussian3dTrainable,
}

impl Gaussian3dTrainerConfig {
    /// Validating the configuration and building the trainer.
    pub fn init<R>(
        &self,
        renderer: R,
    ) -> Result<Gaussian3dTrainer<R>, Error> {
        if self.is_recording_frames && self.frame_stride == 0 {
            return Err(Error::Validation(
                "frame_stride".into(),
                "greater than 0 when recording frames".into(),
            ));
        }
        if self.trainable.is_empty() {
            return Err(Error::Validation(
                "trainable".into(),
                "at least one property".into(),
            ));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(Error::Validation(
                format!("learning_rate ({})", self.learning_rate),
                "a positive finite number".into(),
            ));
        }

        Ok(Gaussian3dTrainer {
            config: self.to_owned(),
            renderer,
        })
    }
}

impl Default for Gaussian3dTrainerConfig {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = Gaussian3dTrainerConfig::default();

        assert_eq!(config.iterations, 1000);
        assert_eq!(config.learning_rate, 0.01);
        assert_eq!(config.frame_stride, 5);
        assert!(config.is_recording_frames);
        assert_eq!(config.trainable, Gaussian3dTrainable::new());
    }

    #[test]
    fn init_with_invalid_values() {
        let result = Gaussian3dTrainerConfig::new()
            .with_frame_stride(0)
            .init(());
        assert!(matches!(result, Err(Error::Validation(..))));

        let result = Gaussian3dTrainerConfig::new()
            .with_frame_stride(0)
            .with_is_recording_frames(false)
            .init(());
        assert!(result.is_ok());

        let result = Gaussian3dTrainerConfig::new()
            .with_trainable(Gaussian3dTrainable::none())
            .init(());
        assert!(matches!(result, Err(Error::Validation(..))));

        let result = Gaussian3dTrainerConfig::new()
            .with_learning_rate(-1.0)
            .init(());
        assert!(matches!(result, Err(Error::Validation(..))));
    }

    #[test]
    fn save_and_load_json() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("config.json");
        let config = Gaussian3dTrainerConfig::new()
            .with_iterations(20)
            .with_trainable(Gaussian3dTrainable::all());

        config.save(&path).unwrap();
        let config_loaded = Gaussian3dTrainerConfig::load(&path).unwrap();

        assert_eq!(config_loaded, config);
    }
}
