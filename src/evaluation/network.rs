//! A small fully connected feed-forward network, used as a learned evaluator.
//!
//! The network is only ever persisted through `to_bytes`/`from_bytes`. The blob format is private to this module.

use std::path::Path;
use std::{fs, io};

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::evaluation::features::{encode_state, NUM_FEATURES};
use crate::evaluation::Evaluator;
use crate::position::{Snapshot, Team};

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("malformed network blob: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("layer {layer} has {found} weights, expected {expected}")]
    Shape {
        layer: usize,
        found: usize,
        expected: usize,
    },
    #[error("layer {layer} takes {found} inputs, but the previous layer has {expected} outputs")]
    Mismatch {
        layer: usize,
        found: usize,
        expected: usize,
    },
    #[error("layer {0} has no inputs or no outputs")]
    Empty(usize),
    #[error("network contains non-finite weights")]
    NonFinite,
    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
struct Layer {
    inputs: usize,
    outputs: usize,
    // Row-major, one row per output
    weights: Vec<f32>,
    biases: Vec<f32>,
}

impl Layer {
    fn random<R: Rng>(inputs: usize, outputs: usize, rng: &mut R) -> Self {
        let scale = 1.0 / (inputs.max(1) as f32).sqrt();
        Layer {
            inputs,
            outputs,
            weights: (0..inputs * outputs)
                .map(|_| rng.gen_range(-scale..=scale))
                .collect(),
            biases: vec![0.0; outputs],
        }
    }

    fn forward(&self, input: &[f32], output: &mut Vec<f32>) {
        output.clear();
        output.extend(
            self.weights
                .chunks(self.inputs)
                .zip(self.biases.iter())
                .map(|(row, bias)| {
                    let sum: f32 = row.iter().zip(input).map(|(w, x)| w * x).sum();
                    (sum + bias).tanh()
                }),
        );
    }

    fn parameters_mut(&mut self) -> impl Iterator<Item = &mut f32> {
        self.weights.iter_mut().chain(self.biases.iter_mut())
    }
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Network {
    layers: Vec<Layer>,
}

impl Network {
    /// Creates a network with random weights. `shape` lists the width of every layer,
    /// starting with the number of inputs and ending with the number of outputs.
    pub fn random<R: Rng>(shape: &[usize], rng: &mut R) -> Self {
        assert!(
            shape.len() >= 2 && shape.iter().all(|width| *width > 0),
            "A network needs non-empty input and output layers"
        );
        Network {
            layers: shape
                .windows(2)
                .map(|pair| Layer::random(pair[0], pair[1], rng))
                .collect(),
        }
    }

    /// A network that takes the standard feature vector as input and outputs a single score
    pub fn for_features<R: Rng>(hidden_layers: &[usize], rng: &mut R) -> Self {
        let mut shape = vec![NUM_FEATURES];
        shape.extend_from_slice(hidden_layers);
        shape.push(1);
        Self::random(&shape, rng)
    }

    pub fn num_inputs(&self) -> usize {
        self.layers.first().map(|layer| layer.inputs).unwrap_or(0)
    }

    pub fn num_outputs(&self) -> usize {
        self.layers.last().map(|layer| layer.outputs).unwrap_or(0)
    }

    pub fn num_parameters(&self) -> usize {
        self.layers
            .iter()
            .map(|layer| layer.weights.len() + layer.biases.len())
            .sum()
    }

    /// Runs the network. Missing inputs are treated as zero, extra inputs are ignored.
    pub fn predict(&self, input: &[f32]) -> Vec<f32> {
        let mut current = input.to_vec();
        current.resize(self.num_inputs(), 0.0);
        let mut next = Vec::new();
        for layer in self.layers.iter() {
            layer.forward(&current, &mut next);
            std::mem::swap(&mut current, &mut next);
        }
        current
    }

    /// Adds gaussian noise to each parameter with probability `rate`
    pub fn mutate<R: Rng>(&mut self, sigma: f32, rate: f64, rng: &mut R) {
        let Ok(noise) = Normal::new(0.0, sigma) else {
            return;
        };
        let rate = if rate.is_nan() { 0.0 } else { rate.clamp(0.0, 1.0) };
        for parameter in self.layers.iter_mut().flat_map(Layer::parameters_mut) {
            if rng.gen_bool(rate) {
                *parameter += noise.sample(rng);
            }
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, NetworkError> {
        self.validate()?;
        Ok(serde_json::to_vec(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, NetworkError> {
        let network: Network = serde_json::from_slice(bytes)?;
        network.validate()?;
        Ok(network)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), NetworkError> {
        fs::write(path, self.to_bytes()?)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, NetworkError> {
        Self::from_bytes(&fs::read(path)?)
    }

    fn validate(&self) -> Result<(), NetworkError> {
        if self.layers.is_empty() {
            return Err(NetworkError::Empty(0));
        }
        let mut expected_inputs = None;
        for (i, layer) in self.layers.iter().enumerate() {
            if layer.inputs == 0 || layer.outputs == 0 {
                return Err(NetworkError::Empty(i));
            }
            if layer.weights.len() != layer.inputs * layer.outputs {
                return Err(NetworkError::Shape {
                    layer: i,
                    found: layer.weights.len(),
                    expected: layer.inputs * layer.outputs,
                });
            }
            if layer.biases.len() != layer.outputs {
                return Err(NetworkError::Shape {
                    layer: i,
                    found: layer.biases.len(),
                    expected: layer.outputs,
                });
            }
            if let Some(expected) = expected_inputs {
                if layer.inputs != expected {
                    return Err(NetworkError::Mismatch {
                        layer: i,
                        found: layer.inputs,
                        expected,
                    });
                }
            }
            expected_inputs = Some(layer.outputs);
        }
        if self
            .layers
            .iter()
            .flat_map(|layer| layer.weights.iter().chain(layer.biases.iter()))
            .any(|parameter| !parameter.is_finite())
        {
            return Err(NetworkError::NonFinite);
        }
        Ok(())
    }
}

impl Evaluator for Network {
    fn score(&self, snapshot: &Snapshot, team: Team) -> f32 {
        let features = encode_state(snapshot, team);
        self.predict(&features).first().copied().unwrap_or(0.0)
    }
}
