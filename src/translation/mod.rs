/*!
 * Translation orchestration.
 *
 * - `cache`: content-addressed memoization of results
 * - `clock`: time source for cooldowns
 * - `scheduler`: credential pool selection, cooldown and failover
 * - `pipeline`: chunking, batching and per-block fallback
 * - `profile`: per-model chunk bounds and timeouts
 * - `prompts`: prompt text and batch markers
 * - `formatting`: clean-up of provider output
 */

pub mod cache;
pub mod clock;
pub mod formatting;
pub mod pipeline;
pub mod profile;
pub mod prompts;
pub mod scheduler;

pub use cache::{CacheKey, TranslationCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use pipeline::{PipelineReport, PipelineSettings, TranslationPipeline};
pub use profile::ModelProfile;
pub use scheduler::{KeyPool, KeyState, KeyStatus, SchedulerConfig};
