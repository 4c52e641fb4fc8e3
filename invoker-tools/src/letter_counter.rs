use invoker_agent::{ToolContext, ToolError, TypedTool};
use invoker_core::Value;
use schemars::JsonSchema;
use serde::Deserialize;

/// Arguments arrive as raw JSON so a model that sends the wrong types gets a
/// zero count instead of a dispatch error.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct LetterCounterArgs {
    /// The input word to search in.
    #[serde(default)]
    #[schemars(with = "String")]
    pub word: Value,
    /// The single letter to count.
    #[serde(default)]
    #[schemars(with = "String")]
    pub letter: Value,
}

/// Counts occurrences of `letter` in `word`, ignoring case.
///
/// Non-string inputs count as zero. A `letter` that is not exactly one
/// character is an [`ToolError::InvalidArgument`].
pub fn count_letter(word: &Value, letter: &Value) -> Result<u64, ToolError> {
    let (Value::String(word), Value::String(letter)) = (word, letter) else {
        return Ok(0);
    };

    if letter.chars().count() != 1 {
        return Err(ToolError::InvalidArgument(
            "The 'letter' parameter must be a single character".to_string(),
        ));
    }

    let needle = letter.to_lowercase();
    Ok(word.to_lowercase().matches(needle.as_str()).count() as u64)
}

pub struct LetterCounter;

impl TypedTool for LetterCounter {
    type Args = LetterCounterArgs;
    type Output = u64;

    const NAME: &'static str = "letter_counter";
    const DESCRIPTION: &'static str = "Count occurrences of a specific letter in a word.";

    async fn run(&self, args: Self::Args, _ctx: ToolContext) -> Result<Self::Output, ToolError> {
        count_letter(&args.word, &args.letter)
    }
}
