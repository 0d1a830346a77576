/////////////////////////////////////////////////////////////////////////////////////////////
//
// Evaluates fitted RBF weights at query nodes in chunked kernel blocks.
//
// Created on: 15 Nov 2025     Author: Daniel Owen 
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License. 
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::{
    config::MorphParams,
    kernel_spec::KernelSpec,
    progress::{ProgressMsg, ProgressSink, chunk_progress},
};
use faer::{Accum, Mat, MatRef, Par, linalg::matmul::matmul};
use morph_rbf_utils::get_a_matrix;
use rayon::prelude::*;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

/// Evaluates `sum_i W_i phi(|q - c_i|)` for every query row `q`.
///
/// Borrowed view over fitted weights; cheap to construct.
pub struct Interpolator<'a> {
    centres: MatRef<'a, f64>,
    weights: MatRef<'a, f64>,
    kernel: &'a KernelSpec,
}

impl<'a> Interpolator<'a> {
    /// `centres` is `N × 3`, `weights` is `N × k`.
    pub fn new(centres: MatRef<'a, f64>, weights: MatRef<'a, f64>, kernel: &'a KernelSpec) -> Self {
        debug_assert_eq!(centres.nrows(), weights.nrows());
        Self {
            centres,
            weights,
            kernel,
        }
    }

    /// Evaluates the field at the rows of `queries` (`M × 3`), returning `M × k`.
    ///
    /// Query rows are split into blocks of `params.eval_chunk_size`. Each block
    /// builds its `chunk × N` kernel matrix and multiplies it by the weights
    /// sequentially, so the output does not depend on `parallel_evaluation`.
    pub fn evaluate(
        &self,
        queries: MatRef<'_, f64>,
        params: &MorphParams,
        progress: Option<&Arc<dyn ProgressSink>>,
    ) -> Mat<f64> {
        let num_queries = queries.nrows();
        let num_cols = self.weights.ncols();

        if num_queries == 0 {
            return Mat::zeros(0, num_cols);
        }

        let chunk_size = params.eval_chunk_size.max(1);
        let total_chunks = num_queries.div_ceil(chunk_size);
        let completed = AtomicUsize::new(0);

        let eval_chunk = |chunk: usize| -> Mat<f64> {
            let start = chunk * chunk_size;
            let rows = chunk_size.min(num_queries - start);
            let block = self.evaluate_block(queries.subrows(start, rows));

            if let Some(sink) = progress {
                let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                sink.emit(ProgressMsg::EvaluationProgress {
                    completed_chunks: done,
                    total_chunks,
                    progress: chunk_progress(done, total_chunks),
                });
            }

            block
        };

        let blocks: Vec<Mat<f64>> = if params.parallel_evaluation && total_chunks > 1 {
            (0..total_chunks).into_par_iter().map(eval_chunk).collect()
        } else {
            (0..total_chunks).map(eval_chunk).collect()
        };

        // Gather in chunk order
        let mut field = Mat::<f64>::zeros(num_queries, num_cols);
        for (chunk, block) in blocks.iter().enumerate() {
            field
                .subrows_mut(chunk * chunk_size, block.nrows())
                .copy_from(block);
        }

        field
    }

    fn evaluate_block(&self, block_queries: MatRef<'_, f64>) -> Mat<f64> {
        let a_matrix = get_a_matrix(block_queries, self.centres, self.kernel.params());

        let mut out = Mat::<f64>::zeros(block_queries.nrows(), self.weights.ncols());
        matmul(
            out.as_mut(),
            Accum::Replace,
            a_matrix.as_ref(),
            self.weights,
            1.0,
            Par::Seq,
        );
        out
    }
}
