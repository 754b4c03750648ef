//! Named command sequences

use async_trait::async_trait;

use super::{ActionHandler, Invocation};
use crate::assistant::{Assistant, Dispatch};
use crate::catalogue::CommandSpec;
use crate::Result;

/// Runs every step of a named macro in order
///
/// Before each step the handler waits for speech to finish; after each
/// executed step it pauses for the configured delay. Steps whose type has
/// no handler are skipped with a warning, and a failing step does not stop
/// the rest.
#[derive(Debug, Clone, Copy, Default)]
pub struct MacroHandler;

#[async_trait]
impl ActionHandler for MacroHandler {
    async fn run(&self, assistant: &Assistant, invocation: Invocation<'_>) -> Result<()> {
        let name = invocation.residual.trim().to_lowercase();
        let Some(steps) = assistant.catalogue().macro_steps(&name) else {
            assistant
                .speak(&format!("I do not have a macro named {name}."))
                .await;
            return Ok(());
        };

        assistant.speak(&format!("Executing macro: {name}.")).await;

        let delay = assistant.config().pacing.macro_step_delay;
        for (index, step) in steps.iter().enumerate() {
            if !assistant.can_dispatch(&step.kind) {
                tracing::warn!(macro_name = %name, step = index, kind = %step.kind, "unknown step type, skipped");
                continue;
            }

            let bare;
            let command = match assistant.catalogue().command_for_type(&step.kind) {
                Some(command) => command,
                None => {
                    bare = CommandSpec::bare(step.kind.as_str());
                    &bare
                }
            };

            assistant.turn().wait_until_silent().await;
            tracing::debug!(macro_name = %name, step = index, kind = %step.kind, data = %step.data, "macro step");
            if assistant.dispatch(command, &step.data).await == Dispatch::Failed {
                tracing::warn!(macro_name = %name, step = index, "macro step failed, continuing");
            }
            tokio::time::sleep(delay).await;
        }

        assistant.speak(&format!("Macro {name} complete.")).await;
        Ok(())
    }
}
