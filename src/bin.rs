use anyhow::Context;
use clap::Parser;
use log::info;

use chip8::{logger, runner, Args, HeadlessFrontend, Runner, TerminalFrontend};

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init(args.log_level.as_deref());

    let chip = runner::load(&args)?;
    let frames = if args.headless {
        Runner::new(chip, HeadlessFrontend::new())
            .with_frame_limit(args.frames)
            .run()
    } else {
        Runner::new(chip, TerminalFrontend::new()?)
            .with_frame_limit(args.frames)
            .run()
    }
    .context("emulation halted")?;

    info!("ran {} frames", frames);
    Ok(())
}
