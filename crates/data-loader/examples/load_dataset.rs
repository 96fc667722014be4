use data_loader::DataIndex;
use std::path::Path;
use std::time::Instant;

fn main() {
    let data_dir = Path::new("data");

    let start = Instant::now();
    let index = DataIndex::load_from_files(data_dir).expect("Failed to load dataset");
    let elapsed = start.elapsed();

    let (users, songs, events) = index.counts();

    println!("=== Load Complete ===");
    println!("Time taken: {:?}", elapsed);
    println!("Users: {}", users);
    println!("Songs: {}", songs);
    println!("Listen events: {}", events);
    println!("Duplicate (user, song) pairs: {}", index.count_duplicate_pairs());
}
