//! Recurrent hidden state for the LSTM perception core.
//!
//! The state is a (hidden, cell) pair of `[batch, hidden_size]` tensors.
//! Every trajectory starts from the zero state; the state is carried across
//! sequential forward calls within an episode and discarded at episode end
//! (resetting is the rollout layer's responsibility). Trajectory segments
//! record the state per timestep as flat vectors so the bootstrap evaluation
//! can replay the exact final state.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

/// Hidden/cell state pair for the recurrent core.
#[derive(Debug, Clone)]
pub struct HiddenState<B: Backend> {
    /// Hidden state: `[batch, hidden_size]`.
    pub hidden: Tensor<B, 2>,
    /// Cell state: `[batch, hidden_size]`.
    pub cell: Tensor<B, 2>,
}

impl<B: Backend> HiddenState<B> {
    /// Create a state from hidden and cell tensors of matching shape.
    pub fn new(hidden: Tensor<B, 2>, cell: Tensor<B, 2>) -> Self {
        assert_eq!(
            hidden.dims(),
            cell.dims(),
            "hidden and cell state must have matching dims"
        );
        Self { hidden, cell }
    }

    /// Zero-valued initial state.
    pub fn zeros(batch: usize, hidden_size: usize, device: &B::Device) -> Self {
        Self {
            hidden: Tensor::zeros([batch, hidden_size], device),
            cell: Tensor::zeros([batch, hidden_size], device),
        }
    }

    /// Batch dimension.
    pub fn batch(&self) -> usize {
        self.hidden.dims()[0]
    }

    /// Hidden width.
    pub fn size(&self) -> usize {
        self.hidden.dims()[1]
    }

    /// Flatten to a vector: hidden first, then cell.
    pub fn to_vec(&self) -> Vec<f32> {
        let h_data = self.hidden.clone().into_data();
        let mut result: Vec<f32> = h_data.as_slice().unwrap().to_vec();

        let c_data = self.cell.clone().into_data();
        result.extend_from_slice(c_data.as_slice().unwrap());

        result
    }

    /// Restore a state from a flat vector produced by [`to_vec`](Self::to_vec).
    pub fn from_vec(
        data: &[f32],
        batch: usize,
        hidden_size: usize,
        device: &B::Device,
    ) -> Self {
        let len = batch * hidden_size;
        assert_eq!(
            data.len(),
            2 * len,
            "state vector length {} does not match 2 * {} * {}",
            data.len(),
            batch,
            hidden_size
        );

        let hidden: Tensor<B, 2> =
            Tensor::<B, 1>::from_floats(&data[..len], device).reshape([batch, hidden_size]);
        let cell: Tensor<B, 2> =
            Tensor::<B, 1>::from_floats(&data[len..], device).reshape([batch, hidden_size]);

        Self { hidden, cell }
    }
}
