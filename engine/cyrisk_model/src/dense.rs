//! Feed-forward network backend.
//!
//! Weights are exported from the training pipeline as JSON and loaded once
//! at startup; the network is read-only afterwards.

use serde::{Deserialize, Serialize};
use std::fs::read_to_string;
use std::path::Path;

use crate::backend::{BackendError, Classifier};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    #[default]
    Identity,
    Relu,
}

/// One fully connected layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseLayer {
    /// Row-major `[output][input]` weight matrix
    pub weights: Vec<Vec<f64>>,
    pub bias: Vec<f64>,
    #[serde(default)]
    pub activation: Activation,
}

impl DenseLayer {
    pub fn new(weights: Vec<Vec<f64>>, bias: Vec<f64>, activation: Activation) -> Self {
        Self {
            weights,
            bias,
            activation,
        }
    }

    pub fn input_width(&self) -> usize {
        self.weights.first().map_or(0, Vec::len)
    }

    pub fn output_width(&self) -> usize {
        self.weights.len()
    }

    fn forward(&self, x: &[f64]) -> Vec<f64> {
        self.weights
            .iter()
            .zip(self.bias.iter())
            .map(|(row, b)| {
                let s = row.iter().zip(x.iter()).map(|(w, v)| w * v).sum::<f64>() + b;
                match self.activation {
                    Activation::Identity => s,
                    Activation::Relu => s.max(0.0),
                }
            })
            .collect()
    }
}

/// Multi-layer perceptron producing one logit per risk category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseNetwork {
    pub model_name: String,
    pub layers: Vec<DenseLayer>,
}

impl DenseNetwork {
    pub fn new(model_name: impl Into<String>, layers: Vec<DenseLayer>) -> Result<Self, BackendError> {
        let network = Self {
            model_name: model_name.into(),
            layers,
        };
        network.validate()?;
        Ok(network)
    }

    /// Check that layer shapes chain together and weights are finite
    pub fn validate(&self) -> Result<(), BackendError> {
        if self.layers.is_empty() {
            return Err(BackendError::LoadError("network has no layers".into()));
        }
        let mut expected_in = self.layers[0].input_width();
        for (idx, layer) in self.layers.iter().enumerate() {
            if layer.output_width() == 0 || layer.input_width() == 0 {
                return Err(BackendError::LoadError(format!("layer {idx} is empty")));
            }
            if layer.input_width() != expected_in {
                return Err(BackendError::LoadError(format!(
                    "layer {idx} expects {} inputs but previous layer produces {expected_in}",
                    layer.input_width()
                )));
            }
            if layer.weights.iter().any(|row| row.len() != expected_in) {
                return Err(BackendError::LoadError(format!(
                    "layer {idx} has ragged weight rows"
                )));
            }
            if layer.bias.len() != layer.output_width() {
                return Err(BackendError::LoadError(format!(
                    "layer {idx} has {} biases for {} outputs",
                    layer.bias.len(),
                    layer.output_width()
                )));
            }
            let finite = layer
                .weights
                .iter()
                .flatten()
                .chain(layer.bias.iter())
                .all(|v| v.is_finite());
            if !finite {
                return Err(BackendError::LoadError(format!(
                    "layer {idx} contains non-finite parameters"
                )));
            }
            expected_in = layer.output_width();
        }
        Ok(())
    }

    pub fn output_width(&self) -> usize {
        self.layers.last().map_or(0, DenseLayer::output_width)
    }

    pub fn from_json(s: &str) -> Result<Self, BackendError> {
        let network: DenseNetwork =
            serde_json::from_str(s).map_err(|e| BackendError::LoadError(e.to_string()))?;
        network.validate()?;
        Ok(network)
    }

    pub fn load_model(path: impl AsRef<Path>) -> Result<Self, BackendError> {
        let path = path.as_ref();
        let s = read_to_string(path)
            .map_err(|e| BackendError::LoadError(format!("{}: {e}", path.display())))?;
        let network = Self::from_json(&s)?;
        log::info!(
            "loaded model '{}' ({} layers, {} -> {})",
            network.model_name,
            network.layers.len(),
            network.input_width(),
            network.output_width()
        );
        Ok(network)
    }
}

impl Classifier for DenseNetwork {
    fn input_width(&self) -> usize {
        self.layers.first().map_or(0, DenseLayer::input_width)
    }

    fn logits(&self, input: &[f64]) -> Result<Vec<f64>, BackendError> {
        if input.len() != self.input_width() {
            return Err(BackendError::InvalidInput(format!(
                "expected {} features, got {}",
                self.input_width(),
                input.len()
            )));
        }
        Ok(self
            .layers
            .iter()
            .fold(input.to_vec(), |x, layer| layer.forward(&x)))
    }

    fn backend_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_layer() -> DenseNetwork {
        DenseNetwork::new(
            "tiny",
            vec![
                DenseLayer::new(
                    vec![vec![1.0, -1.0], vec![-1.0, 1.0]],
                    vec![0.0, 0.5],
                    Activation::Relu,
                ),
                DenseLayer::new(vec![vec![2.0, 1.0]], vec![-0.25], Activation::Identity),
            ],
        )
        .unwrap()
    }

    #[test]
    fn forward_applies_relu_between_layers() {
        let net = two_layer();
        assert_eq!(net.input_width(), 2);
        assert_eq!(net.output_width(), 1);
        // hidden = relu([1, -0.5]) = [1, 0]; out = 2*1 + 0 - 0.25
        let y = net.logits(&[1.0, 0.0]).unwrap();
        assert!((y[0] - 1.75).abs() < 1e-12);
        // hidden = relu([-1, 1.5]) = [0, 1.5]; out = 1.5 - 0.25
        let y = net.logits(&[0.0, 1.0]).unwrap();
        assert!((y[0] - 1.25).abs() < 1e-12);
    }

    #[test]
    fn wrong_input_width_is_rejected() {
        let net = two_layer();
        assert!(matches!(
            net.logits(&[1.0]),
            Err(BackendError::InvalidInput(_))
        ));
    }

    #[test]
    fn validate_catches_shape_mismatches() {
        assert!(DenseNetwork::new("empty", vec![]).is_err());

        let chained_wrong = DenseNetwork::new(
            "bad",
            vec![
                DenseLayer::new(vec![vec![1.0, 1.0]], vec![0.0], Activation::Relu),
                DenseLayer::new(vec![vec![1.0, 1.0]], vec![0.0], Activation::Identity),
            ],
        );
        assert!(matches!(chained_wrong, Err(BackendError::LoadError(_))));

        let short_bias = DenseNetwork::new(
            "bad",
            vec![DenseLayer::new(
                vec![vec![1.0], vec![1.0]],
                vec![0.0],
                Activation::Identity,
            )],
        );
        assert!(short_bias.is_err());

        let ragged = DenseNetwork::new(
            "bad",
            vec![DenseLayer::new(
                vec![vec![1.0, 2.0], vec![1.0]],
                vec![0.0, 0.0],
                Activation::Identity,
            )],
        );
        assert!(ragged.is_err());
    }

    #[test]
    fn activation_defaults_to_identity_in_json() {
        let net = DenseNetwork::from_json(
            r#"{"model_name":"j","layers":[{"weights":[[0.5]],"bias":[0.0]}]}"#,
        )
        .unwrap();
        assert_eq!(net.layers[0].activation, Activation::Identity);
        assert!(DenseNetwork::from_json("{not json").is_err());
    }
}
