use arbgen::device::DeviceWrite;
use arbgen::logging::{init_logging, DEFAULT_FILTER};
use arbgen::{
    BurstLimit, Channel, GenResult, Generator, GeneratorConfig, SimulatedDevice, TriggerSource,
    TriggerTarget, Waveform,
};

fn print_log(gen: &mut Generator<SimulatedDevice>) {
    for write in gen.device().log() {
        match write {
            DeviceWrite::Samples {
                channel,
                size,
                phase_offset,
            } => println!(
                "  {:<4} table        size={} phase_offset={}",
                channel, size, phase_offset
            ),
            other => println!("  {:?}", other),
        }
    }
    gen.device_mut().clear_log();
}

fn print_channel(gen: &Generator<SimulatedDevice>, channel: Channel) -> GenResult<()> {
    println!("{}:", channel);
    println!("  Waveform:       {:?}", gen.waveform(channel));
    println!("  Frequency:      {} Hz", gen.frequency(channel));
    println!("  Phase:          {} deg", gen.phase(channel));
    println!("  Amplitude:      {}", gen.amplitude(channel)?);
    println!("  Offset:         {}", gen.offset(channel)?);
    println!("  Mode:           {:?}", gen.gen_mode(channel)?);
    println!("  Trigger source: {:?}", gen.trigger_source(channel)?);
    println!("  Burst count:    {:?}", gen.burst_count(channel)?);
    println!("  Burst period:   {} us", gen.burst_period(channel)?);
    Ok(())
}

fn demo_waveforms(gen: &mut Generator<SimulatedDevice>) -> GenResult<()> {
    println!("\n=== Waveforms ===\n");

    for waveform in Waveform::ALL {
        gen.set_waveform(Channel::Ch1, waveform)?;
        let table = gen.table(Channel::Ch1);
        let preview: Vec<String> = (0..8)
            .map(|k| format!("{:+.3}", table.samples[k * table.size / 8]))
            .collect();
        println!("{:<10} [{}]", format!("{:?}", waveform), preview.join(", "));
    }

    gen.set_waveform(Channel::Ch1, Waveform::Sine)?;
    gen.device_mut().clear_log();
    Ok(())
}

fn demo_burst(gen: &mut Generator<SimulatedDevice>) -> GenResult<()> {
    println!("\n=== Burst on external trigger ===\n");

    gen.set_waveform(Channel::Ch2, Waveform::Square)?;
    gen.set_frequency(Channel::Ch2, 10_000.0)?;
    gen.set_trigger_source(Channel::Ch2, TriggerSource::ExternalPositiveEdge)?;
    gen.set_burst_count(Channel::Ch2, BurstLimit::Finite(5))?;
    gen.set_burst_repetitions(Channel::Ch2, BurstLimit::Finite(3))?;
    gen.set_burst_period(Channel::Ch2, 2_000)?;
    gen.enable(Channel::Ch2)?;

    println!("Register writes:");
    print_log(gen);
    println!();
    print_channel(gen, Channel::Ch2)?;

    println!("\n--- Manual trigger on both channels ---\n");
    gen.trigger(TriggerTarget::Both)?;
    print_log(gen);
    Ok(())
}

fn run() -> GenResult<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => {
            println!("Config: {}", path);
            GeneratorConfig::from_json_file(path)?
        }
        None => GeneratorConfig::default(),
    };

    let mut gen = Generator::with_config(SimulatedDevice::new(), config)?;
    gen.device_mut().clear_log();

    println!("\n=== Power-on state ===\n");
    for channel in Channel::ALL {
        print_channel(&gen, channel)?;
    }

    demo_waveforms(&mut gen)?;
    demo_burst(&mut gen)?;
    Ok(())
}

fn main() {
    init_logging(DEFAULT_FILTER);

    println!("Arbitrary Waveform Generator (simulated device)");
    println!("===============================================");

    if let Err(e) = run() {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }

    println!("\n===============================================");
    println!("Demo complete!");
}
