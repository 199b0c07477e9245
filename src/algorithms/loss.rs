//! Actor-critic loss with batch-size normalization and sequence masking.
//!
//! Two corrections over a textbook A2C loss:
//!
//! 1. **Batch-size normalization.** Each component is a masked sum divided
//!    by the number of *sequences* (recurrent) or *rows* (non-recurrent),
//!    not by the number of valid elements. Averaging over batches keeps the
//!    loss scale invariant when the batch composition changes, so
//!    hyperparameters transfer across batch sizes.
//! 2. **Sequence masking.** With a recurrent policy, batches are padded to
//!    the longest sequence; padded elements must contribute nothing to any
//!    loss component.
//!
//! The loss returns an explicit [`LossOutput`] carrying the scalar
//! components alongside the differentiable total, so the stats reporter
//! reads the same batch it was computed from.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::config::A2CConfig;
use crate::core::segment::{sequence_mask, TrainBatch};

use super::distribution::Categorical;

/// Model forward outputs consumed by the loss.
pub struct ModelOutputs<B: Backend> {
    /// Action logits: `[rows, n_actions]`.
    pub logits: Tensor<B, 2>,
    /// Value estimates: `[rows]`.
    pub values: Tensor<B, 1>,
}

/// Scalar loss components for reporting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LossComponents {
    /// Policy gradient loss.
    pub policy_loss: f32,
    /// Value function loss.
    pub value_loss: f32,
    /// Entropy term (negative mean entropy; added with a positive
    /// coefficient it rewards exploratory policies).
    pub entropy: f32,
}

/// Result of one loss computation.
pub struct LossOutput<B: Backend> {
    /// Differentiable total loss (single-element tensor).
    pub total: Tensor<B, 1>,
    /// Scalar components for the stats reporter.
    pub components: LossComponents,
}

/// Compute the combined actor-critic loss for one training batch.
///
/// With `seq_lens` present the batch is treated as padded sequences: the
/// validity mask is derived from the true lengths against the padded
/// maximum, and the effective batch size is the sequence count. Otherwise
/// every row is valid and the effective batch size is the row count.
///
/// `total = policy_loss + vf_loss_coeff * value_loss + entropy_coeff * entropy`
pub fn actor_critic_loss<B: Backend>(
    config: &A2CConfig,
    outputs: &ModelOutputs<B>,
    batch: &TrainBatch,
) -> LossOutput<B> {
    batch.validate();

    let rows = batch.rows();
    assert_eq!(
        outputs.logits.dims()[0],
        rows,
        "logits rows do not match batch rows"
    );
    assert_eq!(
        outputs.values.dims()[0],
        rows,
        "values rows do not match batch rows"
    );

    let device = outputs.logits.device();

    let (mask_vec, batch_size) = match &batch.seq_lens {
        Some(lens) => (sequence_mask(lens, batch.max_seq_len()), lens.len()),
        None => (vec![1.0f32; rows], rows),
    };
    let b = batch_size as f32;

    let mask = Tensor::<B, 1>::from_floats(mask_vec.as_slice(), &device);
    let advantages = Tensor::<B, 1>::from_floats(batch.advantages.as_slice(), &device);
    let value_targets = Tensor::<B, 1>::from_floats(batch.value_targets.as_slice(), &device);

    let dist = Categorical::new(outputs.logits.clone());
    let log_probs = dist.log_prob(&batch.actions, &device);

    let policy_loss =
        -(advantages * log_probs * mask.clone()).sum().div_scalar(b);

    let value_loss = ((outputs.values.clone() - value_targets) * mask.clone())
        .powf_scalar(2.0)
        .sum()
        .div_scalar(b);

    let entropy = -(dist.entropy() * mask).sum().div_scalar(b);

    let total = policy_loss.clone()
        + value_loss.clone().mul_scalar(config.vf_loss_coeff)
        + entropy.clone().mul_scalar(config.entropy_coeff);

    let components = LossComponents {
        policy_loss: scalar(&policy_loss),
        value_loss: scalar(&value_loss),
        entropy: scalar(&entropy),
    };

    LossOutput { total, components }
}

fn scalar<B: Backend>(t: &Tensor<B, 1>) -> f32 {
    t.clone().into_data().as_slice::<f32>().unwrap()[0]
}

// Scalar reference implementations, used by tests to pin the tensor math.

/// Reference policy loss: `-sum(adv * logp * mask) / batch_size`.
pub fn policy_loss_scalar(
    advantages: &[f32],
    log_probs: &[f32],
    mask: &[f32],
    batch_size: usize,
) -> f32 {
    let sum: f32 = advantages
        .iter()
        .zip(log_probs)
        .zip(mask)
        .map(|((a, lp), m)| a * lp * m)
        .sum();
    -sum / batch_size as f32
}

/// Reference value loss: `sum(((v - target) * mask)^2) / batch_size`.
pub fn value_loss_scalar(
    values: &[f32],
    targets: &[f32],
    mask: &[f32],
    batch_size: usize,
) -> f32 {
    let sum: f32 = values
        .iter()
        .zip(targets)
        .zip(mask)
        .map(|((v, t), m)| ((v - t) * m).powi(2))
        .sum();
    sum / batch_size as f32
}

/// Reference entropy term: `-sum(entropy * mask) / batch_size`.
pub fn entropy_scalar(entropies: &[f32], mask: &[f32], batch_size: usize) -> f32 {
    let sum: f32 = entropies.iter().zip(mask).map(|(e, m)| e * m).sum();
    -sum / batch_size as f32
}
