use journey_core::prelude::*;

fn sample_timetable() -> TransitData {
    let mut builder = TimetableBuilder::new();
    builder
        .vj("blue")
        .at("airport", 6 * 3600)
        .at("central", 6 * 3600 + 1_200)
        .at("harbour", 6 * 3600 + 2_400);
    builder
        .vj("green")
        .at("central", 6 * 3600 + 1_800)
        .at("old town", 6 * 3600 + 2_700)
        .at("stadium", 6 * 3600 + 3_600);
    builder
        .vj("night owl")
        .at("stadium", 23 * 3600 + 1_800)
        .at("airport", 24 * 3600 + 900);
    builder.build()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let store = DataStore::new();
    store.load_with(|| Ok(sample_timetable()))?;
    let guard = store.try_shared()?;

    let instant = std::time::Instant::now();
    let path = guard.compute(&Query {
        origin: 0, // airport
        destination: 4, // stadium
        departure: 6 * 3600 - 600,
        day: 0,
    });
    println!("Query time: {:?}", instant.elapsed());

    for item in &path.items {
        let name = &guard.data().stop_areas[item.stop_area as usize].name;
        let line = &guard.data().vehicle_journeys[item.line as usize].name;
        println!(
            "day {} {:02}:{:02}:{:02}  {name}  ({line})",
            item.day,
            item.seconds / 3600,
            item.seconds % 3600 / 60,
            item.seconds % 60,
        );
    }

    for leg in legs(&path) {
        println!(
            "leg: line {} from area {} to area {}",
            leg.line, leg.board.stop_area, leg.alight.stop_area
        );
    }

    Ok(())
}
