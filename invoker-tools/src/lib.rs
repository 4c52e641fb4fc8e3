//! Built-in tools: arithmetic, current time, and a letter counter.

mod calculator;
mod current_time;
mod letter_counter;

pub use calculator::{evaluate, Calculator, CalculatorArgs, CalculatorOutput};
pub use current_time::{parse_timezone, CurrentTime, CurrentTimeArgs, CurrentTimeOutput};
pub use letter_counter::{count_letter, LetterCounter, LetterCounterArgs};

use invoker_agent::{ToolSet, ToolSetBuildError};

/// Calculator, current time and letter counter, in one set.
pub fn builtin_toolset(current_time: CurrentTime) -> Result<ToolSet, ToolSetBuildError> {
    ToolSet::new()
        .register_with(Calculator)
        .register_with(current_time)
        .register_with(LetterCounter)
        .build()
}
