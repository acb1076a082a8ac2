//! Utility to explore a deck's parts and timing trees for development
use deckflow::animation::extract_animations;
use deckflow::DeckContainer;

fn excerpt(content: &str, max: usize) -> &str {
    match content.char_indices().nth(max) {
        Some((idx, _)) => &content[..idx],
        None => content,
    }
}

fn main() -> deckflow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "test-files/file_example_PPT_1MB.pptx".to_string());
    let container = DeckContainer::open_path(&path)?;

    println!("=== Files in archive ===");
    for file in container.list_files() {
        println!("  {}", file);
    }

    println!("\n=== ppt/presentation.xml ===");
    if let Ok(content) = container.read_xml("ppt/presentation.xml") {
        println!("{}", excerpt(&content, 2000));
    }

    println!("\n=== Slide order ===");
    let slides = container.slide_paths();
    for (i, slide) in slides.iter().enumerate() {
        println!("  {:>3}  {}", i + 1, slide);
    }

    for (i, slide) in slides.iter().enumerate() {
        let Ok(xml) = container.read_xml(slide) else {
            continue;
        };
        let Some(start) = xml.find("<p:timing") else {
            continue;
        };
        println!("\n=== {} timing (first 3000 chars) ===", slide);
        println!("{}", excerpt(&xml[start..], 3000));

        let animations = extract_animations(&container, i + 1);
        println!("--- {} descriptors, {} skipped", animations.descriptors.len(), animations.skipped);
        for d in &animations.descriptors {
            println!(
                "  {:<10} {:<16} target={:<4} {:?} dur={} delay={}",
                d.category.as_str(),
                d.effect,
                d.target_id,
                d.trigger,
                d.duration,
                d.delay
            );
        }
    }

    Ok(())
}
