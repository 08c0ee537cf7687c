//! # auto-ease - 自适应难度系数 (ease factor) 调整
//!
//! 根据卡片的复习历史调整其 ease factor，使长期回忆成功率收敛到目标值:
//!
//! - **Moving Average** - 指数加权移动平均
//! - **Success Rate** - 平滑后的回忆成功率
//! - **Correction** - 基于 Ebbinghaus 遗忘曲线的修正比例 ln(target)/ln(rate)
//! - **Leash** - 非对称步长限制，防止单次复习造成剧烈波动
//! - **Replay** - 重放完整历史，重新生成一致的 ease 序列
//!
//! ## 模块结构
//!
//! - [`moving_average`] - 加权移动平均
//! - [`success_rate`] - 成功率估计
//! - [`correction`] - 修正模型 (估计值、leashed/unleashed 建议)
//! - [`leash`] - 步长限制与取整
//! - [`replay`] - 历史重放 (单卡、并行批量)
//! - [`store`] - 复习记录存储接口与内存实现
//! - [`adjust`] - 实时调整、整组重算、同步后重算
//! - [`stats`] - 卡片诊断信息
//! - [`snapshot`] - ease 快照导入/导出
//! - [`config`] - 引擎与牌组配置
//! - [`types`] - 公共类型和常量
//!
//! ## 使用示例
//!
//! ```rust
//! use auto_ease::{replay, EngineConfig, ReviewOutcome};
//!
//! let config = EngineConfig::default();
//! let history = [ReviewOutcome::Good, ReviewOutcome::Good, ReviewOutcome::Again];
//! let factors = replay(&config, 2500, &history).unwrap();
//! assert_eq!(factors, vec![2500, 2574, 2654, 2370]);
//! ```

// ============================================================================
// 模块声明
// ============================================================================

pub mod adjust;
pub mod config;
pub mod correction;
pub mod error;
pub mod leash;
pub mod logging;
pub mod moving_average;
pub mod replay;
pub mod snapshot;
pub mod stats;
pub mod store;
pub mod success_rate;
pub mod types;

// ============================================================================
// 重新导出
// ============================================================================

pub use types::*;

pub use config::{DeckOptions, EngineConfig};
pub use error::{EaseError, EaseResult};

pub use moving_average::moving_average;
pub use success_rate::success_rate;
pub use correction::{estimate, suggest, EaseEstimate, LeashMode};
pub use leash::clamp;
pub use replay::{replay, replay_many, step, ReplayInput};

pub use store::{Collection, MemoryStore, ReviewStore};
pub use adjust::{
    adjust_after_sync, adjust_cards, adjust_deck, adjust_on_answer, BatchOptions, BatchReport, CardInputs, NoProgress,
    ProgressSink, SyncCheckpoint,
};
pub use stats::{card_stats, CardStats};
pub use snapshot::{export_deck, import_deck, EaseSnapshot, ImportReport};
