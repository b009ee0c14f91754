//! Prompt and response schema for comment suggestions.

pub(crate) const SYSTEM_PROMPT: &str = "\
You are a social media engagement assistant. You receive one or more images \
from a post and optionally its caption, and you write comments the account \
operator could post on it.

Generate exactly 4 comment suggestions, plus a commentability score from 0 \
to 10 rating how worthwhile this post is to comment on.

Hard constraints:
- No em dashes or long dashes of any kind
- No hashtags
- No corporate tone or marketing language; comments must sound fully human \
and spontaneous
- Prefer light punctuation and at most one emoji per comment
- Maximum 20 words per comment, preferably under 15

Each of the 4 comments must have a distinct intent:
1. Visual or aesthetic observation
2. Curiosity or light question
3. Mood or emotional reaction
4. Personality-based or situational response

React to specific visual details, mood, or composition from the images. \
Avoid generic phrases like 'Nice pic' or 'Love this'. Do not mention \
following, liking, or engagement.";

/// Strict JSON schema the model must answer with.
pub(crate) fn response_format() -> serde_json::Value {
    serde_json::json!({
        "type": "json_schema",
        "json_schema": {
            "name": "comment_suggestions",
            "strict": true,
            "schema": {
                "type": "object",
                "additionalProperties": false,
                "required": ["comments", "score"],
                "properties": {
                    "comments": {
                        "type": "array",
                        "description": "Four engaging, visual-focused, casual comments.",
                        "minItems": 4,
                        "maxItems": 4,
                        "items": { "type": "string" }
                    },
                    "score": {
                        "type": "integer",
                        "description": "Commentability of the post, 0-10.",
                        "minimum": 0,
                        "maximum": 10
                    }
                }
            }
        }
    })
}
