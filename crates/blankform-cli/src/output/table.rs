use blankform_core::model::{Line, Segment};
use blankform_core::parsing::markers::{self, CLOSE, OPEN, SEPARATOR};
use blankform_core::registry::{FieldDescriptor, FieldOrigin};

pub fn print_lines(lines: &[Line]) {
    let fields: usize = lines.iter().map(Line::field_count).sum();
    println!("{} line(s), {} field(s)\n", lines.len(), fields);

    for (i, line) in lines.iter().enumerate() {
        if !line.has_fields() {
            continue;
        }
        println!("  [{:>3}] {:<7} {}", i, line.alignment, line.text());
        for segment in line.fields() {
            match segment {
                Segment::TextField { content, .. } => {
                    println!("          text      {:?}", content);
                }
                Segment::Checkbox { checked, content } => {
                    let mark = if *checked { "[x]" } else { "[ ]" };
                    println!("          checkbox  {} {:?}", mark, content);
                }
                Segment::StaticText { .. } => {}
            }
        }
    }
}

/// Lines with every field bracketed, for checking what the catalog claimed.
pub fn print_annotated(lines: &[Line]) {
    for line in lines {
        let visible: String = markers::annotate(line)
            .chars()
            .map(|c| match c {
                OPEN => '[',
                SEPARATOR => '|',
                CLOSE => ']',
                other => other,
            })
            .collect();
        println!("{visible}");
    }
}

pub fn print_located(fields: &[FieldDescriptor]) {
    if fields.is_empty() {
        println!("No fields found.");
        return;
    }
    println!("{} field(s)\n", fields.len());
    println!(
        "  {:>4}  {:<9} {:>8} {:>8} {:>8} {:>8}  {}",
        "page", "kind", "x", "y", "width", "height", "value"
    );

    for field in fields {
        let page = match field.origin {
            FieldOrigin::Page { page } => page + 1,
            FieldOrigin::Paragraph { line, .. } => line + 1,
        };
        let (x, y) = field
            .bbox
            .map(|b| (b.x_min, b.y_min))
            .unwrap_or((0.0, 0.0));
        println!(
            "  {:>4}  {:<9} {:>8.1} {:>8.1} {:>8.1} {:>8.1}  {}",
            page,
            field.component,
            x,
            y,
            field.args.width.unwrap_or(0.0),
            field.args.height.unwrap_or(0.0),
            field.initial_value
        );
    }
}
