//! Indented, colorized outline of a structure tree for terminal inspection.
use colored::Colorize;

use crate::loose::Leaf;
use crate::structure::Structure;

const INDENT: &str = "  ";

pub fn render(root: &Structure) -> String {
    let mut out = String::new();
    // (depth, entry label, node); children pushed in reverse to pop in order
    let mut stack: Vec<(usize, String, &Structure)> = vec![(0, String::new(), root)];
    while let Some((depth, label, node)) = stack.pop() {
        out.push_str(&INDENT.repeat(depth));
        out.push_str(&label);
        out.push_str(&node_line(node));
        out.push('\n');
        match node {
            Structure::Leaf(_) => {}
            Structure::Map(m) => {
                let children: Vec<_> = m.iter().collect();
                for (k, v) in children.into_iter().rev() {
                    stack.push((depth + 1, format!("{}: ", k.to_string().cyan()), v));
                }
            }
            Structure::FixedList(l) => {
                let children: Vec<_> = l.iter().enumerate().collect();
                for (i, v) in children.into_iter().rev() {
                    stack.push((depth + 1, format!("{} ", format!("[{i}]").dimmed()), v));
                }
            }
        }
    }
    out
}

fn node_line(node: &Structure) -> String {
    match node {
        Structure::Map(m) => format!("{} ({} entries)", "Map".blue().bold(), m.len()),
        Structure::FixedList(l) => format!("{} ({} items)", "FixedList".green().bold(), l.len()),
        Structure::Leaf(leaf) => leaf_line(leaf),
    }
}

fn leaf_line(leaf: &Leaf) -> String {
    let value = match leaf {
        Leaf::Null => return "null".yellow().to_string(),
        Leaf::Bool(b) => b.to_string(),
        Leaf::Int(i) => i.to_string(),
        Leaf::Float(x) => x.0.to_string(),
        Leaf::Str(s) => format!("{s:?}"),
        Leaf::Opaque(name) => return format!("{} {name}", "opaque".yellow()),
    };
    format!("{} {}", leaf.type_name().yellow(), value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build;
    use crate::loose::Loose;
    use serde_json::json;

    #[test]
    fn outline_shows_kinds_and_keys() {
        colored::control::set_override(false);
        let s = build(Loose::from(json!([{"key": [1, "two"]}, null]))).unwrap();
        let expected = "\
FixedList (2 items)
  [0] Map (1 entries)
    \"key\": FixedList (2 items)
      [0] integer 1
      [1] string \"two\"
  [1] null
";
        assert_eq!(render(&s), expected);
    }

    #[test]
    fn integer_map_keys_are_unquoted() {
        colored::control::set_override(false);
        let s = build(Loose::from(json!({"3": true, "x": 1.5}))).unwrap();
        assert_eq!(render(&s), "Map (2 entries)\n  3: bool true\n  \"x\": float 1.5\n");
    }
}
