//! Message bodies shared by the commands and the stockboards.

use giftbot_common::models::content::MessageContent;
use giftbot_common::models::inventory::Inventory;

pub const STOCK_TITLE: &str = "📦 Live Stock Gift";
pub const NO_ITEMS_LINE: &str = "No items.";
pub const GIFT_TITLE: &str = "🎁 You received a gift!";
pub const GIFT_FOOTER: &str = "Keep these codes secret.";

// Discord rejects embed descriptions over 4096 characters.
const MAX_DESCRIPTION: usize = 4000;
// Embed field values are capped at 1024 characters.
const MAX_FIELD_VALUE: usize = 1024;
// Keeps the whole embed under Discord's 6000 character total.
const MAX_CODE_FIELDS: usize = 4;
const CODE_FENCE: &str = "```";
pub const CODES_FILENAME: &str = "codes.txt";

pub fn stock_line(item: &str, count: usize) -> String {
    format!("🔹 **{item}** · Stock: {count}")
}

/// One line per item in ledger order, or the "no items" line.
pub fn render_stock_summary(inventory: &Inventory) -> MessageContent {
    let description = if inventory.is_empty() {
        NO_ITEMS_LINE.to_string()
    } else {
        let mut out = String::new();
        let mut shown = 0;
        for (item, codes) in inventory.iter() {
            let line = stock_line(item, codes.len());
            if out.len() + line.len() + 1 > MAX_DESCRIPTION {
                break;
            }
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&line);
            shown += 1;
        }
        if shown < inventory.len() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&format!("…and {} more", inventory.len() - shown));
        }
        out
    };

    MessageContent::titled(STOCK_TITLE)
        .description(description)
        .timestamped()
}

/// The private message a recipient gets: item, codes one per line in
/// withdrawal order, and who sent them.
///
/// Codes are split over several fields when one would overflow. When even
/// that does not fit in one embed they go out as an attached text file.
pub fn render_gift(item: &str, codes: &[String], sender: &str) -> MessageContent {
    let mut content = MessageContent::titled(GIFT_TITLE).field("Item", item, true);

    match code_blocks(codes) {
        Some(blocks) => {
            let total = blocks.len();
            for (i, block) in blocks.into_iter().enumerate() {
                content = content.field(codes_field_name(codes.len(), i, total), block, false);
            }
        }
        None => {
            content = content
                .field(
                    format!("Codes ({})", codes.len()),
                    format!("See the attached {CODES_FILENAME}."),
                    false,
                )
                .attach(CODES_FILENAME, codes.join("\n"));
        }
    }

    content
        .field("Sent by", sender, false)
        .footer(GIFT_FOOTER)
        .timestamped()
}

fn codes_field_name(count: usize, index: usize, total: usize) -> String {
    if total == 1 {
        format!("Codes ({count})")
    } else {
        format!("Codes ({count}) {}/{total}", index + 1)
    }
}

/// Packs codes, in order, into fenced blocks of at most `MAX_FIELD_VALUE`
/// characters. `None` if they need more than `MAX_CODE_FIELDS` blocks.
fn code_blocks(codes: &[String]) -> Option<Vec<String>> {
    let fence_len = CODE_FENCE.len() * 2 + 2;
    let budget = MAX_FIELD_VALUE - fence_len;

    let mut blocks: Vec<String> = Vec::new();
    let mut current = String::new();
    for code in codes {
        let needed = if current.is_empty() { code.chars().count() } else { code.chars().count() + 1 };
        if current.chars().count() + needed > budget {
            if current.is_empty() {
                // A single code longer than a field.
                return None;
            }
            blocks.push(fence(&current));
            current.clear();
            if code.chars().count() > budget {
                return None;
            }
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(code);
        if blocks.len() >= MAX_CODE_FIELDS {
            return None;
        }
    }
    if !current.is_empty() || blocks.is_empty() {
        blocks.push(fence(&current));
    }
    (blocks.len() <= MAX_CODE_FIELDS).then_some(blocks)
}

fn fence(body: &str) -> String {
    format!("{CODE_FENCE}\n{body}\n{CODE_FENCE}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_lists_every_item_with_count() {
        let inv: Inventory = vec![
            ("gold".to_string(), vec!["x".to_string(), "y".to_string()]),
            ("diamond".to_string(), vec![]),
        ]
        .into_iter()
        .collect();

        let content = render_stock_summary(&inv);
        let desc = content.description.unwrap();
        let lines: Vec<&str> = desc.lines().collect();
        assert_eq!(lines, vec![stock_line("gold", 2), stock_line("diamond", 0)]);
        assert_eq!(content.title.as_deref(), Some(STOCK_TITLE));
    }

    #[test]
    fn test_empty_summary() {
        let content = render_stock_summary(&Inventory::new());
        assert_eq!(content.description.as_deref(), Some(NO_ITEMS_LINE));
    }

    #[test]
    fn test_summary_is_truncated_for_huge_ledgers() {
        let inv: Inventory = (0..500)
            .map(|i| (format!("item-with-a-long-name-{i}"), vec![]))
            .collect();
        let desc = render_stock_summary(&inv).description.unwrap();
        assert!(desc.len() <= MAX_DESCRIPTION + 32);
        assert!(desc.ends_with("more"));
    }

    #[test]
    fn test_gift_lists_codes_in_order() {
        let codes = vec!["a1".to_string(), "a2".to_string()];
        let content = render_gift("diamond", &codes, "admin#0001");
        assert_eq!(content.field_value("Item"), Some("diamond"));
        assert_eq!(content.field_value("Codes (2)"), Some("```\na1\na2\n```"));
        assert_eq!(content.field_value("Sent by"), Some("admin#0001"));
        assert!(content.attachment.is_none());
    }

    fn block_body(value: &str) -> &str {
        value
            .strip_prefix("```\n")
            .and_then(|v| v.strip_suffix("\n```"))
            .unwrap()
    }

    #[test]
    fn test_many_codes_split_across_fields_in_order() {
        let codes: Vec<String> = (0..100).map(|i| format!("CODE-{i:04}-ABCDEFG")).collect();
        let content = render_gift("nitro", &codes, "admin");

        let blocks: Vec<&str> = content
            .fields
            .iter()
            .filter(|f| f.name.starts_with("Codes (100)"))
            .map(|f| f.value.as_str())
            .collect();
        assert!(blocks.len() > 1);
        assert!(blocks.iter().all(|b| b.chars().count() <= MAX_FIELD_VALUE));

        let joined: Vec<&str> = blocks.iter().flat_map(|b| block_body(b).lines()).collect();
        let expected: Vec<&str> = codes.iter().map(String::as_str).collect();
        assert_eq!(joined, expected);
        assert_eq!(content.fields.first().map(|f| f.name.as_str()), Some("Item"));
        assert_eq!(content.fields.last().map(|f| f.name.as_str()), Some("Sent by"));
        assert!(content.attachment.is_none());
    }

    #[test]
    fn test_huge_gift_goes_out_as_attachment() {
        let codes: Vec<String> = (0..1000).map(|i| format!("CODE-{i:04}-ABCDEFG")).collect();
        let content = render_gift("nitro", &codes, "admin");

        let attachment = content.attachment.clone().unwrap();
        assert_eq!(attachment.filename, CODES_FILENAME);
        let lines: Vec<&str> = attachment.body.lines().collect();
        assert_eq!(lines.len(), 1000);
        assert_eq!(lines.first(), Some(&"CODE-0000-ABCDEFG"));
        assert_eq!(lines.last(), Some(&"CODE-0999-ABCDEFG"));
        assert_eq!(
            content.field_value("Codes (1000)"),
            Some("See the attached codes.txt.")
        );
    }

    #[test]
    fn test_oversized_first_line_has_no_leading_newline() {
        let long = "x".repeat(MAX_DESCRIPTION + 10);
        let inv: Inventory = vec![(long, vec![]), ("gold".to_string(), vec![])]
            .into_iter()
            .collect();
        let desc = render_stock_summary(&inv).description.unwrap();
        assert_eq!(desc, "…and 2 more");
    }
}
