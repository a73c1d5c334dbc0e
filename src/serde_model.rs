//! JSON persistence for a trained [`NeuralNet`] (feature: `serde`).
//!
//! The on-disk format is a versioned mirror of [`Params`] rather than the in-memory structs,
//! so internal changes do not break saved models. Every matrix is stored as
//! `{ rows, cols, data }` with `data` in row-major order.
//!
//! Loading validates the format version, the shapes of all four matrices and that every
//! parameter is finite.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Activation, Error, Matrix, NeuralNet, Params, Result};

pub const MODEL_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedNet {
    pub format_version: u32,
    pub hidden: usize,
    pub hidden_activation: SerializedActivation,
    pub w1: SerializedMatrix,
    pub b1: SerializedMatrix,
    pub w2: SerializedMatrix,
    pub b2: SerializedMatrix,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedMatrix {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SerializedActivation {
    Relu,
    Sigmoid,
}

impl From<Activation> for SerializedActivation {
    fn from(value: Activation) -> Self {
        match value {
            Activation::ReLU => SerializedActivation::Relu,
            Activation::Sigmoid => SerializedActivation::Sigmoid,
        }
    }
}

impl From<SerializedActivation> for Activation {
    fn from(value: SerializedActivation) -> Self {
        match value {
            SerializedActivation::Relu => Activation::ReLU,
            SerializedActivation::Sigmoid => Activation::Sigmoid,
        }
    }
}

impl From<&Matrix> for SerializedMatrix {
    fn from(m: &Matrix) -> Self {
        Self {
            rows: m.rows(),
            cols: m.cols(),
            data: m.data().to_vec(),
        }
    }
}

impl SerializedMatrix {
    fn into_matrix(self, name: &str) -> Result<Matrix> {
        if self.data.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidData(format!("{name} must contain only finite values")));
        }
        Matrix::from_flat(self.rows, self.cols, self.data)
            .map_err(|e| Error::InvalidData(format!("{name} invalid: {e}")))
    }
}

impl SerializedNet {
    pub fn validate(&self) -> Result<()> {
        if self.format_version != MODEL_FORMAT_VERSION {
            return Err(Error::InvalidData(format!(
                "unsupported model format_version {}; expected {}",
                self.format_version, MODEL_FORMAT_VERSION
            )));
        }
        if self.w1.cols != self.hidden {
            return Err(Error::InvalidData(format!(
                "w1 has {} columns, expected hidden width {}",
                self.w1.cols, self.hidden
            )));
        }
        Ok(())
    }
}

impl TryFrom<&NeuralNet> for SerializedNet {
    type Error = Error;

    fn try_from(net: &NeuralNet) -> std::result::Result<Self, Self::Error> {
        let params = net
            .params()
            .ok_or_else(|| Error::NotTrained("cannot serialize an untrained network".to_owned()))?;
        Ok(Self {
            format_version: MODEL_FORMAT_VERSION,
            hidden: params.hidden(),
            hidden_activation: net.config().hidden_activation.into(),
            w1: (&params.w1).into(),
            b1: (&params.b1).into(),
            w2: (&params.w2).into(),
            b2: (&params.b2).into(),
        })
    }
}

impl TryFrom<SerializedNet> for NeuralNet {
    type Error = Error;

    fn try_from(value: SerializedNet) -> std::result::Result<Self, Self::Error> {
        value.validate()?;
        let params = Params {
            w1: value.w1.into_matrix("w1")?,
            b1: value.b1.into_matrix("b1")?,
            w2: value.w2.into_matrix("w2")?,
            b2: value.b2.into_matrix("b2")?,
        };
        // from_params checks that the four shapes chain together.
        NeuralNet::from_params(params, value.hidden_activation.into())
            .map_err(|e| Error::InvalidData(format!("invalid parameters: {e}")))
    }
}

impl NeuralNet {
    /// Serialize the trained network to a pretty-printed JSON string.
    pub fn to_json_string_pretty(&self) -> Result<String> {
        let ser = SerializedNet::try_from(self)?;
        serde_json::to_string_pretty(&ser)
            .map_err(|e| Error::InvalidData(format!("failed to serialize model: {e}")))
    }

    /// Serialize the trained network to a compact JSON string.
    pub fn to_json_string(&self) -> Result<String> {
        let ser = SerializedNet::try_from(self)?;
        serde_json::to_string(&ser)
            .map_err(|e| Error::InvalidData(format!("failed to serialize model: {e}")))
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let ser: SerializedNet = serde_json::from_str(s)
            .map_err(|e| Error::InvalidData(format!("failed to parse model json: {e}")))?;
        ser.try_into()
    }

    /// Save the network to a JSON file (pretty-printed).
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let s = self.to_json_string_pretty()?;
        let p = path.as_ref();
        std::fs::write(p, s)
            .map_err(|e| Error::InvalidData(format!("failed to write {}: {e}", p.display())))
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let p = path.as_ref();
        let s = std::fs::read_to_string(p)
            .map_err(|e| Error::InvalidData(format!("failed to read {}: {e}", p.display())))?;
        Self::from_json_str(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_net() -> NeuralNet {
        let params = Params {
            w1: Matrix::from_array([[1.0, -2.0]]),
            b1: Matrix::from_array([[0.5, 0.0]]),
            w2: Matrix::from_array([[0.25, -1.0], [3.0, 0.75]]),
            b2: Matrix::from_array([[0.0, -0.5]]),
        };
        NeuralNet::from_params(params, Activation::ReLU).unwrap()
    }

    #[test]
    fn golden_json_is_stable_and_roundtrips() {
        let json = small_net().to_json_string_pretty().unwrap();

        let golden = include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/tests/golden/net_v1.json"
        ))
        .trim_end();
        assert_eq!(json, golden);

        let loaded = NeuralNet::from_json_str(golden).unwrap();
        assert_eq!(loaded.params(), small_net().params());
        assert_eq!(loaded.to_json_string_pretty().unwrap(), golden);
    }

    #[test]
    fn rejects_unknown_version() {
        let mut ser = SerializedNet::try_from(&small_net()).unwrap();
        ser.format_version = 999;
        let json = serde_json::to_string(&ser).unwrap();
        let err = NeuralNet::from_json_str(&json).unwrap_err();
        assert!(format!("{err}").contains("format_version"));
    }

    #[test]
    fn rejects_mismatched_shapes() {
        let mut ser = SerializedNet::try_from(&small_net()).unwrap();
        ser.b2 = SerializedMatrix {
            rows: 1,
            cols: 3,
            data: vec![0.0; 3],
        };
        let json = serde_json::to_string(&ser).unwrap();
        assert!(NeuralNet::from_json_str(&json).is_err());

        let mut ser = SerializedNet::try_from(&small_net()).unwrap();
        ser.w1.data.pop();
        let json = serde_json::to_string(&ser).unwrap();
        assert!(NeuralNet::from_json_str(&json).is_err());
    }

    #[test]
    fn rejects_non_finite_parameters() {
        let mut ser = SerializedNet::try_from(&small_net()).unwrap();
        ser.w2.data[0] = f64::NAN;
        let err = NeuralNet::try_from(ser).unwrap_err();
        assert!(format!("{err}").contains("finite"));
    }

    #[test]
    fn untrained_network_cannot_be_saved() {
        let net = NeuralNet::new(crate::TrainConfig::default());
        assert!(matches!(net.to_json_string(), Err(Error::NotTrained(_))));
    }
}
