//! 抽签
//!
//! 从所有 Verified Draw 中等概率随机取一条。

use std::sync::Arc;

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::Draw;
use thiserror::Error;

use crate::db::{DrawStore, StoreError};

#[derive(Debug, Error)]
pub enum FortuneError {
    #[error("no verified draws available")]
    EmptyResult,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// 随机抽签
pub struct FortuneSelector {
    draws: Arc<dyn DrawStore>,
    rng: Mutex<StdRng>,
}

impl FortuneSelector {
    /// `seed` 为 None 时使用系统熵
    pub fn new(draws: Arc<dyn DrawStore>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            draws,
            rng: Mutex::new(rng),
        }
    }

    pub async fn draw_fortune(&self) -> Result<Draw, FortuneError> {
        let mut candidates: Vec<Draw> = self
            .draws
            .list_verified()
            .await?
            .into_iter()
            .filter(Draw::is_verified)
            .collect();

        let index = match candidates.len() {
            0 => return Err(FortuneError::EmptyResult),
            1 => 0,
            n => self.rng.lock().gen_range(0..n),
        };
        Ok(candidates.swap_remove(index))
    }
}
