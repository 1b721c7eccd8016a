// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_note_content(sections: usize) -> String {
    let mut content = String::new();
    for section in 0..sections {
        content.push_str(&format!("### Workflow {section}\n\n"));
        content.push_str("Each Project has a Task list and a Meeting cadence.\n");
        content.push_str("Already linked: [[Project]] and [[Milestone]].\n");
        content.push_str("- The Team owns the Goal and tracks every Deadline\n");
        content.push_str("- A Note serves as the Document of record\n\n");
        content.push_str(&format!("Done evolving {section}.\n\n"));
    }
    content
}

#[allow(dead_code)]
pub fn link_candidates() -> Vec<&'static str> {
    vec![
        "Project",
        "Task",
        "Meeting",
        "Document",
        "Note",
        "Person",
        "Team",
        "Goal",
        "HCAI",
        "Milestone",
        "Deadline",
        "serves",
    ]
}
