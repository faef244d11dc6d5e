use std::path::Path;

use colored::Colorize;
use gr_core::TilePos;

pub fn run(dir: &Path, content: Option<&Path>) -> Result<(), String> {
    let (map, content) = super::load_world(Some(dir), content)?;

    let total = (map.width() * map.height()) as usize;
    let walkable = map.walkable_count();
    let (items, species, quests) = content.counts();

    println!("  {} {}", "Map".bold(), dir.display().to_string().dimmed());
    println!("  {}x{} tiles", map.width(), map.height());
    println!(
        "  {walkable} walkable ({:.1}%), {} blocked",
        walkable as f64 * 100.0 / total as f64,
        total - walkable
    );
    println!("  {items} items, {species} species, {quests} quests");

    let spawns: Vec<(String, TilePos)> = content
        .npc_spawns()
        .iter()
        .map(|s| (format!("npc {}", s.entity_index), s.position))
        .chain(
            content
                .item_spawns()
                .iter()
                .map(|s| (format!("item {}", s.item_id), s.position)),
        )
        .collect();
    let blocked: Vec<_> = spawns
        .iter()
        .filter(|(_, pos)| map.is_blocked(*pos))
        .collect();
    if blocked.is_empty() {
        println!("  {} spawns OK", spawns.len());
    } else {
        for (what, pos) in &blocked {
            println!(
                "  {} {what} spawns on blocked tile ({}, {})",
                "WARN".yellow().bold(),
                pos.x,
                pos.y
            );
        }
    }
    Ok(())
}
