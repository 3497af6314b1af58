use chip8_vm::{memory::FONT, Builder, Chip8, Error, FrameView, HEIGHT, WIDTH};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Big-endian byte image of the given instruction words
fn assemble(words: &[u16]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_be_bytes().to_vec()).collect()
}

fn chip_with(words: &[u16]) -> Chip8 {
    init_logger();
    let prog = assemble(words);
    Builder::new().with_program(&prog).build().unwrap()
}

/// One string per display row, `#` is lit and `.` is unlit
fn render(view: FrameView<'_>) -> Vec<String> {
    (0..HEIGHT)
        .map(|y| {
            (0..WIDTH)
                .map(|x| if view.pixel(x, y) { '#' } else { '.' })
                .collect()
        })
        .collect()
}

#[test]
fn load_keeps_program_and_font() {
    init_logger();
    for _ in 0..32 {
        let len = rand::random::<usize>() % (0xE00 + 1);
        let prog: Vec<u8> = (0..len).map(|_| rand::random::<u8>()).collect();
        let chip = Builder::new().with_program(&prog).build().unwrap();
        assert_eq!(chip.memory()[0x200..0x200 + len], prog[..]);
        assert_eq!(chip.memory()[0x050..0x0A0], FONT[..]);
    }
}

#[test]
fn capacity_boundary() {
    init_logger();
    let mut chip = Chip8::new(0);
    assert_eq!(chip.load_program(&[0x11; 4096 - 0x200]), Ok(()));

    let mut chip2 = Chip8::new(0);
    assert_eq!(
        chip2.load_program(&[0x11; 4096 - 0x200 + 1]),
        Err(Error::CapacityExceeded {
            size: 4096 - 0x200 + 1,
            capacity: 4096 - 0x200,
        }),
    );
    assert!(chip2.memory()[0x0A0..].iter().all(|&b| b == 0));
    assert_eq!(chip2.memory()[0x050..0x0A0], FONT[..]);
    assert_eq!(chip.memory()[0xFFF], 0x11);
}

#[test]
fn sampled_add_and_sub_flags() {
    for _ in 0..512 {
        let (a, b) = (rand::random::<u8>(), rand::random::<u8>());
        // V1 = a, V2 = b, V1 += V2, V3 = a, V3 -= V2
        let mut chip = chip_with(&[
            0x6100 | a as u16,
            0x6200 | b as u16,
            0x8124,
            0x6300 | a as u16,
            0x8325,
        ]);
        for _ in 0..3 {
            chip.execute_cycle().unwrap();
        }
        assert_eq!(chip.v(1), a.wrapping_add(b));
        assert_eq!(chip.v(0xF), (a as u16 + b as u16 > 255) as u8);
        for _ in 0..2 {
            chip.execute_cycle().unwrap();
        }
        assert_eq!(chip.v(3), a.wrapping_sub(b));
        assert_eq!(chip.v(0xF), (a >= b) as u8);
    }
}

#[test]
fn clear_flags_draw_once() {
    let mut chip = chip_with(&[0x00E0, 0x1202]);
    chip.execute_cycle().unwrap();
    assert!(render(chip.display()).iter().all(|row| !row.contains('#')));
    assert!(chip.consume_draw_flag());
    assert!(!chip.consume_draw_flag());
    chip.execute_cycle().unwrap();
    assert!(!chip.consume_draw_flag());
}

#[test]
fn double_draw_restores_display() {
    // glyph "8" at (20, 10), drawn twice
    let mut chip = chip_with(&[0x6008, 0xF029, 0x6014, 0x610A, 0xD015, 0xD015]);
    for _ in 0..5 {
        chip.execute_cycle().unwrap();
    }
    assert_eq!(chip.v(0xF), 0);
    assert_eq!(chip.display().lit_count(), 16);
    chip.execute_cycle().unwrap();
    assert_eq!(chip.v(0xF), 1);
    assert_eq!(chip.display().lit_count(), 0);
}

#[test]
fn draws_decimal_digits() {
    #[rustfmt::skip]
    let mut chip = chip_with(&[
        0x6089, // V0 = 137
        0xA300, // I = 0x300
        0xF033, // BCD of V0 at I
        0xF265, // V0..V2 = digits
        0x6300, // V3 = 0
        0x6400, // V4 = 0
        0xF029, 0xD345, 0x7305,
        0xF129, 0xD345, 0x7305,
        0xF229, 0xD345,
        0x121C, // spin
    ]);
    chip.execute_frame().unwrap();
    chip.execute_frame().unwrap();
    assert!(chip.consume_draw_flag());
    assert_eq!(chip.memory()[0x300..0x303], [1u8, 3, 7]);

    let expected = [
        "..#..####.####",
        ".##.....#....#",
        "..#..####...#.",
        "..#.....#..#..",
        ".###.####..#..",
    ];
    let rows = render(chip.display());
    for (row, want) in rows.iter().zip(expected.iter()) {
        assert_eq!(&row[..14], *want);
        assert!(!row[14..].contains('#'));
    }
    assert!(rows[5..].iter().all(|row| !row.contains('#')));
}

#[cfg(feature = "embedded-graphics")]
#[test]
fn raw_image_matches_display() {
    use chip8_vm::embedded_graphics::{image::IntoPixelIter, pixelcolor::BinaryColor};

    let mut chip = chip_with(&[0x6005, 0x6110, 0xA050, 0xD01F]);
    for _ in 0..4 {
        chip.execute_cycle().unwrap();
    }
    let view = chip.display();
    let mut rows = vec![vec!['.'; WIDTH]; HEIGHT];
    view.as_raw_image().pixel_iter().for_each(|px| {
        if px.1 == BinaryColor::On {
            rows[px.0.y as usize][px.0.x as usize] = '#';
        }
    });
    let rows: Vec<String> = rows.into_iter().map(|row| row.into_iter().collect()).collect();
    assert_eq!(rows, render(view));
}

#[test]
fn timers_stay_in_range() {
    for _ in 0..16 {
        let start = rand::random::<u8>();
        let fps = 1 + rand::random::<u32>() % 240;
        // V0 = start, delay = sound = V0, then read delay into V1 forever
        let mut chip = chip_with(&[0x6000 | start as u16, 0xF015, 0xF018, 0xF107, 0x1206]);
        chip.set_frame_rate(fps).unwrap();
        chip.set_clock_speed(fps * 4).unwrap();
        let mut previous = start;
        for _ in 0..1200 {
            chip.execute_frame().unwrap();
            let delay = chip.delay_timer();
            assert!(delay <= previous);
            assert_eq!(chip.sound_timer(), delay);
            previous = delay;
        }
        // 1200 frames at 240 fps or less cover at least 5 seconds
        assert_eq!(chip.delay_timer(), 0);
        assert!(!chip.should_beep());
    }
}

#[test]
fn key_wait_example() {
    let mut chip = chip_with(&[0xF30A]);
    let pc = chip.pc();
    chip.execute_cycle().unwrap();
    assert_eq!(chip.pc(), pc);

    chip.keys_mut()[5] = true;
    chip.execute_cycle().unwrap();
    assert_eq!(chip.v(3), 5);
    assert_eq!(chip.pc(), pc + 2);
}

#[test]
fn key_wait_does_not_stall_timers() {
    let mut chip = chip_with(&[0x6003, 0xF015, 0xF00A]);
    chip.execute_frame().unwrap();
    chip.execute_frame().unwrap();
    assert_eq!(chip.pc(), 0x204);
    assert_eq!(chip.delay_timer(), 1);
}

#[test]
fn errors_halt_frame() {
    let mut chip = chip_with(&[0x00EE]);
    assert_eq!(chip.execute_frame(), Err(Error::StackUnderflow));

    let mut chip = chip_with(&[0x5121]);
    assert_eq!(chip.execute_frame(), Err(Error::UnknownInstruction(0x5121)));
    assert_eq!(
        Error::UnknownInstruction(0x5121).to_string(),
        "unknown instruction 0x5121"
    );
}
