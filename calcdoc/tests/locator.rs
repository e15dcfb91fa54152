use calcdoc::{BlockParser, CalcBlock, Fences, MemoryDocument};

const OPERATORS: [&str; 11] = [
    "+", "-", "*", "/", "mod", "swap", "1/x", "sqrt", "sin", "cos", "tan",
];

fn doc(lines: &[&str]) -> MemoryDocument {
    MemoryDocument::new("file:///test.md", lines.join("\n"))
}

fn blocks(lines: &[&str]) -> Vec<CalcBlock> {
    BlockParser::default().find_calc_blocks(&doc(lines), &OPERATORS)
}

#[test]
fn single_block_skips_operator_line() {
    let found = blocks(&["```calc", "3", "4", "+", "```"]);
    assert_eq!(
        found,
        vec![CalcBlock {
            start_line: 1,
            end_line: 3,
            stack: vec![3.0, 4.0],
        }]
    );
}

#[test]
fn empty_region_between_fences() {
    let found = blocks(&["```calc", "```"]);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].start_line, 1);
    assert_eq!(found[0].end_line, 0);
    assert!(found[0].is_empty());
    assert!(found[0].stack.is_empty());
}

#[test]
fn unterminated_region_yields_nothing() {
    assert!(blocks(&["```calc", "1", "2"]).is_empty());
    let found = blocks(&["```calc", "1", "```", "```calc", "2"]);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].stack, vec![1.0]);
}

#[test]
fn nested_open_fence_is_ignored() {
    let found = blocks(&["```calc", "1", "```calc", "2", "```"]);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].start_line, 1);
    assert_eq!(found[0].end_line, 3);
    assert_eq!(found[0].stack, vec![1.0, 2.0]);
}

#[test]
fn stray_close_fence_outside_region_is_ignored() {
    let found = blocks(&["```", "text", "```calc", "5", "```"]);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].start_line, 3);
}

#[test]
fn fences_match_trimmed_lines_exactly() {
    let found = blocks(&["  ```calc  ", "1", "\t```"]);
    assert_eq!(found.len(), 1);

    assert!(blocks(&["```calculator", "1", "```"]).is_empty());
    assert!(blocks(&["```calc x", "1", "```"]).is_empty());
}

#[test]
fn blocks_are_in_document_order() {
    let found = blocks(&[
        "# notes", "```calc", "1", "```", "prose", "```calc", "2", "3", "```",
    ]);
    let spans: Vec<(usize, usize)> = found.iter().map(|b| (b.start_line, b.end_line)).collect();
    assert_eq!(spans, vec![(2, 2), (6, 7)]);
    assert_eq!(found[1].stack, vec![2.0, 3.0]);
}

#[test]
fn commentary_and_malformed_lines_are_inert() {
    let found = blocks(&[
        "```calc",
        "  2.5  ",
        "",
        "# empty",
        "total so far",
        "NaN",
        "-1e3",
        "```",
    ]);
    assert_eq!(found[0].stack, vec![2.5, -1000.0]);
}

#[test]
fn lines_starting_with_a_number_keep_the_number() {
    let found = blocks(&["```calc", "12 apples", "3abc", "2.5kg", "apples 4", "```"]);
    assert_eq!(found[0].stack, vec![12.0, 3.0, 2.5]);
}

#[test]
fn operator_skip_uses_the_given_token_set() {
    let document = doc(&["```calc", "1", "neg", "```"]);
    let parser = BlockParser::default();
    // "neg" is not a number either way; registering it only makes it an operator.
    let found = parser.find_calc_blocks(&document, &["neg"]);
    assert_eq!(found[0].stack, vec![1.0]);

    let found = parser.find_calc_blocks(&document, &["1"]);
    assert!(found[0].stack.is_empty());
}

#[test]
fn parse_stack_clamps_to_document_length() {
    let document = doc(&["```calc", "1", "2"]);
    let stack = BlockParser::default().parse_stack(&document, 1, 40, &OPERATORS);
    assert_eq!(stack, vec![1.0, 2.0]);
}

#[test]
fn reparsing_serialized_output_is_stable() {
    let stack = vec![7.0, 0.2, -3.5, 1e-7, 12345678.9];
    let serialized: Vec<String> = stack.iter().map(|n| n.to_string()).collect();
    let mut lines = vec!["```calc".to_string()];
    lines.extend(serialized);
    lines.push("```".to_string());
    let document = MemoryDocument::new("file:///s.md", lines.join("\n"));

    let found = BlockParser::default().find_calc_blocks(&document, &OPERATORS);
    assert_eq!(found[0].stack, stack);
}

#[test]
fn containment_includes_closing_fence_line() {
    let block = CalcBlock {
        start_line: 2,
        end_line: 4,
        stack: Vec::new(),
    };
    let blocks = [block];
    let parser = BlockParser::default();
    for line in 2..=5 {
        assert!(parser.find_block_containing_line(&blocks, line).is_some(), "line {line}");
    }
    assert!(parser.find_block_containing_line(&blocks, 1).is_none());
    assert!(parser.find_block_containing_line(&blocks, 6).is_none());
}

#[test]
fn custom_fences() {
    let parser = BlockParser::new(Fences {
        open: "~~~rpn".to_string(),
        close: "~~~".to_string(),
    });
    let document = doc(&["~~~rpn", "9", "~~~", "```calc", "1", "```"]);
    let found = parser.find_calc_blocks(&document, &OPERATORS);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].stack, vec![9.0]);
}
