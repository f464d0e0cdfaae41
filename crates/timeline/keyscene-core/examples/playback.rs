use keyscene_core::{CancelToken, JsonSourceLoader, SceneSession};
use serde_json::to_string_pretty;

const SCENE: &str = include_str!("../../../../fixtures/scenes/showcase.json");
const INTRO: &str = include_str!("../../../../fixtures/sources/intro.json");
const FINALE: &str = include_str!("../../../../fixtures/sources/finale.json");

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut session = SceneSession::from_json_str(SCENE)?;
    let loader = JsonSourceLoader::new()
        .with_source("intro", INTRO)
        .with_source("finale", FINALE);
    let report = session.load_sources(&loader, &CancelToken::new());
    println!("Extraction report:\n{}", to_string_pretty(&report)?);
    session.initialize();

    // A second of idle animation before the user presses play.
    for _ in 0..60 {
        session.tick(1.0 / 60.0);
    }
    session.play();

    let mut last_second = -1;
    for _ in 0..(15 * 60) {
        let out = session.tick(1.0 / 60.0);
        let second = out.clock.floor() as i32;
        if second != last_second {
            last_second = second;
            for frame in &out.frames {
                let p = frame.snapshot.position;
                println!(
                    "t={:5.2} {:<10} phase={:?} pos=({:.2}, {:.2}, {:.2}) end={:.2}",
                    out.clock, frame.name, frame.phase_index, p[0], p[1], p[2], frame.end_factor
                );
            }
        }
    }

    for event in session.drain_diagnostics() {
        println!("Diagnostic: {}", to_string_pretty(&event)?);
    }
    Ok(())
}
