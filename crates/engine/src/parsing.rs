use crate::{Amount, Direction, ParseError, TransactionDraft};

/// Parses a chat message into a draft transaction.
///
/// Format: `category,tool,method,(+|-),amount,note`
/// - the message is trimmed, then split on ASCII `,`; there is no escaping, so
///   a comma inside the note adds a field
/// - each field is trimmed
/// - `+` => income, `-` => expense
/// - the amount is an integer with an optional sign
/// - the note may be empty, but its field must be present
pub fn parse_message(input: &str) -> Result<TransactionDraft, ParseError> {
    let parts: Vec<&str> = input.trim().split(',').map(str::trim).collect();
    let [category, tool, method, marker, amount, note] = parts[..] else {
        return Err(ParseError::MalformedInput(parts.len()));
    };

    let direction = Direction::from_marker(marker)
        .ok_or_else(|| ParseError::InvalidDirection(marker.to_string()))?;
    let amount = amount
        .parse::<Amount>()
        .map_err(|_| ParseError::InvalidAmount(amount.to_string()))?;

    Ok(TransactionDraft {
        category: category.to_string(),
        tool: tool.to_string(),
        method: method.to_string(),
        direction,
        amount,
        note: note.to_string(),
    })
}
