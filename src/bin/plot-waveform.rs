use arbgen::generator::{synthesize, ShapeParams};
use arbgen::{Waveform, BUFFER_LENGTH};
use plotters::prelude::*;

struct Args {
    waveform: Waveform,
    output_path: String,
    duty_cycle: f32,
    frequency: f32,
}

fn print_usage() {
    eprintln!("Usage: plot-waveform <waveform> <output.svg> [duty_cycle] [frequency_hz]");
    eprintln!();
    eprintln!("Waveforms: sine, triangle, square, ramp_up, ramp_down, dc, pwm");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  plot-waveform sine sine.svg");
    eprintln!("  plot-waveform pwm pwm.svg 0.2");
    eprintln!("  plot-waveform square square.svg 0.5 5000000  # wide edges at 5 MHz");
}

fn parse_args() -> Result<Args, Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 || args.len() > 5 {
        print_usage();
        return Err("Invalid number of arguments".into());
    }

    let waveform: Waveform = args[1].parse()?;
    let output_path = args[2].clone();
    let duty_cycle: f32 = match args.get(3) {
        Some(s) => s.parse()?,
        None => 0.5,
    };
    let frequency: f32 = match args.get(4) {
        Some(s) => s.parse()?,
        None => 1000.0,
    };

    if waveform == Waveform::Arbitrary {
        return Err("Arbitrary waveforms have no built-in shape to plot".into());
    }
    if !(0.0..=1.0).contains(&duty_cycle) {
        return Err("Duty cycle must be between 0.0 and 1.0".into());
    }
    if frequency <= 0.0 {
        return Err("Frequency must be positive".into());
    }

    Ok(Args {
        waveform,
        output_path,
        duty_cycle,
        frequency,
    })
}

fn create_plot(args: &Args, samples: &[f32]) -> Result<(), Box<dyn std::error::Error>> {
    let root = SVGBackend::new(&args.output_path, (800, 400)).into_drawing_area();
    root.fill(&WHITE)?;

    let title = format!(
        "{:?}: duty={:.2}, f={} Hz, {} samples",
        args.waveform,
        args.duty_cycle,
        args.frequency,
        samples.len()
    );

    let mut chart = ChartBuilder::on(&root)
        .caption(&title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0f32..samples.len() as f32, -1.1f32..1.1f32)?;

    chart
        .configure_mesh()
        .x_desc("Sample")
        .y_desc("Level")
        .x_labels(10)
        .y_labels(11)
        .draw()?;

    chart.draw_series(LineSeries::new(
        samples.iter().enumerate().map(|(i, &s)| (i as f32, s)),
        BLUE.stroke_width(2),
    ))?;

    root.present()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = parse_args()?;

    println!("Waveform Plot Generator");
    println!("=======================");
    println!("  Waveform: {:?}", args.waveform);
    println!("  Duty cycle: {:.2}", args.duty_cycle);
    println!("  Frequency: {} Hz", args.frequency);
    println!();

    print!("  Synthesizing table... ");
    let arbitrary = vec![0.0f32; BUFFER_LENGTH];
    let params = ShapeParams {
        duty_cycle: args.duty_cycle,
        frequency: args.frequency,
        arbitrary: &arbitrary,
        arbitrary_len: BUFFER_LENGTH,
    };
    let table = synthesize(args.waveform, &params);
    println!("done ({} samples)", table.size);

    let (min, max) = table
        .active()
        .iter()
        .fold((f32::MAX, f32::MIN), |(lo, hi), &s| (lo.min(s), hi.max(s)));
    println!("  Range: [{:.3}, {:.3}]", min, max);

    print!("  Creating plot... ");
    create_plot(&args, table.active())?;
    println!("done");

    println!();
    println!("Output: {}", args.output_path);

    Ok(())
}
