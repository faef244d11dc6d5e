use crate::context::SimContext;
use crate::error::SimResult;

/// One stage of the tick.
///
/// [`crate::Simulation`] runs its systems in registration order after the
/// intake is drained and due effects are applied. An error from one system is
/// logged and the remaining systems still run.
pub trait System: std::fmt::Debug + Send {
    /// Name used in log records.
    fn name(&self) -> &str;

    /// Advance this stage by one tick.
    fn tick(&mut self, ctx: &mut SimContext<'_>) -> SimResult<()>;

    /// Runs once before the first tick.
    fn init(&mut self, _ctx: &mut SimContext<'_>) -> SimResult<()> {
        Ok(())
    }
}
