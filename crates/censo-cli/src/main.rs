#![forbid(unsafe_code)]

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use censo_cli::{format_detailed, format_money, format_summary_line, menu};
use censo_engine::{
    NumericField, dominant_group_per_city, filter_by_filing_group, find_by_id, global_max,
    max_by_city, max_by_filing_group, oldest, oldest_by_city, top_average_net_worth_cities,
};
use censo_gen::Generator;
use censo_perf::{Monitor, current_memory_kb, measure_peak_kb};
use censo_types::{FilingGroup, Persona};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

enum Input<T> {
    Value(T),
    Invalid,
    Eof,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut seed: Option<u64> = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--seed" => {
                let value = args.next().ok_or("--seed requires a value")?;
                seed = Some(value.parse()?);
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other => return Err(format!("unknown argument: {other}").into()),
        }
    }

    let seed = seed.unwrap_or_else(clock_seed);
    debug!(seed, "starting interactive session");
    run(seed)
}

fn print_help() {
    println!("censo - synthetic demographic/financial records and aggregate queries");
    println!();
    println!("usage: censo [--seed N]");
    println!();
    println!("  --seed N   pin the generator seed for a reproducible session");
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos() as u64)
        .unwrap_or_default()
}

fn no_data() {
    println!("No data available. Use option 0 first.");
}

fn sample_memory_kb() -> i64 {
    match current_memory_kb() {
        Ok(kb) => kb,
        Err(err) => {
            warn!(error = %err, "memory sample unavailable");
            0
        }
    }
}

/// Bracket one query: memory sample before, timer around, delta after,
/// stat line, log append.
fn with_monitor<R>(monitor: &mut Monitor, operation: &str, op: impl FnOnce() -> R) -> R {
    let memory_before = sample_memory_kb();
    monitor.start_timer();
    let result = op();
    let elapsed = monitor.stop_timer();
    let memory = sample_memory_kb() - memory_before;
    println!("{}", Monitor::format_stat(operation, elapsed, memory));
    monitor.record(operation, elapsed, memory);
    result
}

fn prompt<T: std::str::FromStr>(
    lines: &mut impl Iterator<Item = io::Result<String>>,
    text: &str,
) -> io::Result<Input<T>> {
    print!("{text}");
    io::stdout().flush()?;
    let Some(line) = lines.next() else {
        return Ok(Input::Eof);
    };
    match line?.trim().parse::<T>() {
        Ok(value) => Ok(Input::Value(value)),
        Err(_) => Ok(Input::Invalid),
    }
}

fn run(seed: u64) -> Result<(), Box<dyn std::error::Error>> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let mut generator = Generator::from_seed(seed);
    let mut monitor = Monitor::new();
    let mut dataset: Option<Vec<Persona>> = None;

    loop {
        println!("{}", menu());
        let choice = match prompt::<u32>(&mut lines, "Select an option: ")? {
            Input::Value(choice) => choice,
            Input::Invalid => {
                println!("Invalid option.");
                continue;
            }
            Input::Eof => break,
        };

        match choice {
            0 => {
                let n = match prompt::<usize>(&mut lines, "How many records? ")? {
                    Input::Value(n) => n,
                    Input::Invalid => {
                        println!("Invalid input.");
                        continue;
                    }
                    Input::Eof => break,
                };
                if n == 0 {
                    println!("At least one record is required.");
                    continue;
                }

                monitor.start_timer();
                let (generated, peak_kb) = match measure_peak_kb(|| generator.generate_many(n)) {
                    Ok((generated, peak_kb)) => (generated, peak_kb),
                    Err(err) => {
                        warn!(error = %err, "peak-memory sampling unavailable");
                        (generator.generate_many(n), 0)
                    }
                };
                let elapsed = monitor.stop_timer();

                let personas = match generated {
                    Ok(personas) => personas,
                    Err(err) => {
                        println!("Generation failed: {err}");
                        continue;
                    }
                };
                println!("Generated {} records.", personas.len());
                // The old collection is dropped and replaced in one move; no
                // query ever sees a partially rebuilt dataset.
                dataset = Some(personas);

                println!("{}", Monitor::format_stat("generate dataset", elapsed, peak_kb));
                monitor.record("generate dataset", elapsed, peak_kb);
            }

            1 => {
                let Some(personas) = dataset.as_deref() else {
                    no_data();
                    continue;
                };
                with_monitor(&mut monitor, "list records", || {
                    println!("\n=== RECORDS ({}) ===", personas.len());
                    for (index, persona) in personas.iter().enumerate() {
                        println!("{index}. {}", format_summary_line(persona));
                    }
                });
            }

            2 => {
                let Some(personas) = dataset.as_deref() else {
                    no_data();
                    continue;
                };
                let range = format!("Index (0-{}): ", personas.len().saturating_sub(1));
                let index = match prompt::<usize>(&mut lines, &range)? {
                    Input::Value(index) => index,
                    Input::Invalid => {
                        println!("Invalid input.");
                        continue;
                    }
                    Input::Eof => break,
                };
                with_monitor(&mut monitor, "show detail", || match personas.get(index) {
                    Some(persona) => println!("{}", format_detailed(persona)),
                    None => println!("Index out of range."),
                });
            }

            3 => {
                let Some(personas) = dataset.as_deref() else {
                    no_data();
                    continue;
                };
                let id = match prompt::<String>(&mut lines, "Id to find: ")? {
                    Input::Value(id) => id,
                    Input::Invalid => {
                        println!("Invalid input.");
                        continue;
                    }
                    Input::Eof => break,
                };
                with_monitor(&mut monitor, "find by id", || {
                    match find_by_id(personas, &id) {
                        Some(persona) => println!("{}", format_detailed(persona)),
                        None => println!("No record with id {id}."),
                    }
                });
            }

            4 => print!("{}", monitor.render_summary()),

            5 => {
                let Some(personas) = dataset.as_deref() else {
                    no_data();
                    continue;
                };
                let pick = match prompt::<u32>(&mut lines, "1. Overall  2. Per city: ")? {
                    Input::Value(pick) => pick,
                    Input::Invalid => {
                        println!("Invalid option.");
                        continue;
                    }
                    Input::Eof => break,
                };
                match pick {
                    1 => with_monitor(&mut monitor, "oldest overall", || match oldest(personas) {
                        Some(persona) => {
                            println!("\n=== Oldest person ===");
                            println!("{}", format_detailed(persona));
                        }
                        None => println!("No records."),
                    }),
                    2 => with_monitor(&mut monitor, "oldest per city", || {
                        println!("\n=== Oldest person per city ===");
                        for (city, persona) in oldest_by_city(personas) {
                            println!(
                                "- {city}: {} {} ({})",
                                persona.given_name(),
                                persona.surname(),
                                persona.birth_date()
                            );
                        }
                    }),
                    _ => println!("Invalid option."),
                }
            }

            6 => {
                let Some(personas) = dataset.as_deref() else {
                    no_data();
                    continue;
                };
                let pick = match prompt::<u32>(
                    &mut lines,
                    "1. Overall  2. Per city  3. Per filing group: ",
                )? {
                    Input::Value(pick) => pick,
                    Input::Invalid => {
                        println!("Invalid option.");
                        continue;
                    }
                    Input::Eof => break,
                };
                match pick {
                    1 => with_monitor(&mut monitor, "max net worth overall", || {
                        match global_max(personas, NumericField::NetWorth) {
                            Some(persona) => {
                                println!("\n=== Largest net worth ===");
                                println!("{}", format_detailed(persona));
                            }
                            None => println!("No records."),
                        }
                    }),
                    2 => with_monitor(&mut monitor, "max net worth per city", || {
                        println!("\n=== Largest net worth per city ===");
                        for (city, persona) in max_by_city(personas, NumericField::NetWorth) {
                            println!(
                                "- {city}: {} {} ({})",
                                persona.given_name(),
                                persona.surname(),
                                format_money(persona.net_worth())
                            );
                        }
                    }),
                    3 => with_monitor(&mut monitor, "max net worth per filing group", || {
                        println!("\n=== Largest net worth per filing group ===");
                        for (group, persona) in
                            max_by_filing_group(personas, NumericField::NetWorth)
                        {
                            println!(
                                "- {}: {} {} ({})",
                                group.as_char(),
                                persona.given_name(),
                                persona.surname(),
                                format_money(persona.net_worth())
                            );
                        }
                    }),
                    _ => println!("Invalid option."),
                }
            }

            7 => {
                let Some(personas) = dataset.as_deref() else {
                    no_data();
                    continue;
                };
                let pick = match prompt::<u32>(
                    &mut lines,
                    "1. List one group  2. Count all groups  3. Group of an id: ",
                )? {
                    Input::Value(pick) => pick,
                    Input::Invalid => {
                        println!("Invalid option.");
                        continue;
                    }
                    Input::Eof => break,
                };
                match pick {
                    1 => {
                        let letter = match prompt::<char>(&mut lines, "Group (A/B/C/N): ")? {
                            Input::Value(letter) => letter,
                            Input::Invalid => {
                                println!("Invalid input.");
                                continue;
                            }
                            Input::Eof => break,
                        };
                        let Some(group) = FilingGroup::from_char(letter) else {
                            println!("Unknown group {letter:?}.");
                            continue;
                        };
                        with_monitor(&mut monitor, "list filing group", || {
                            let matches = filter_by_filing_group(personas, group);
                            for persona in &matches {
                                println!("{}", format_summary_line(persona));
                            }
                            println!(
                                "Group {} has {} records.",
                                group.as_char(),
                                matches.len()
                            );
                        });
                    }
                    2 => with_monitor(&mut monitor, "count filing groups", || {
                        for group in [FilingGroup::A, FilingGroup::B, FilingGroup::C] {
                            let count = filter_by_filing_group(personas, group).len();
                            println!("Group {} has {} records.", group.as_char(), count);
                        }
                    }),
                    3 => {
                        let id = match prompt::<String>(&mut lines, "Id to check: ")? {
                            Input::Value(id) => id,
                            Input::Invalid => {
                                println!("Invalid input.");
                                continue;
                            }
                            Input::Eof => break,
                        };
                        with_monitor(&mut monitor, "filing group lookup", || {
                            match find_by_id(personas, &id) {
                                Some(persona) => println!(
                                    "{} {} belongs to group {}.",
                                    persona.given_name(),
                                    persona.surname(),
                                    persona.filing_group().as_char()
                                ),
                                None => println!("No record with id {id}."),
                            }
                        });
                    }
                    _ => println!("Invalid option."),
                }
            }

            8 => {
                let Some(personas) = dataset.as_deref() else {
                    no_data();
                    continue;
                };
                with_monitor(&mut monitor, "dominant group per city", || {
                    match dominant_group_per_city(personas) {
                        Ok(report) => {
                            println!("\n=== Dominant filing group per city ===");
                            for tally in report {
                                println!(
                                    "- {}: A={} B={} C={} -> {}",
                                    tally.city,
                                    tally.counts[0],
                                    tally.counts[1],
                                    tally.counts[2],
                                    tally.dominant.as_char()
                                );
                            }
                        }
                        Err(err) => println!("Data integrity error: {err}"),
                    }
                });
            }

            9 => {
                let Some(personas) = dataset.as_deref() else {
                    no_data();
                    continue;
                };
                with_monitor(&mut monitor, "top average net worth cities", || {
                    match top_average_net_worth_cities(personas, 3) {
                        Ok(ranking) => {
                            println!("\n=== Top cities by average net worth ===");
                            for entry in ranking {
                                println!(
                                    "- {}: {} ({} records)",
                                    entry.city,
                                    format_money(entry.mean_net_worth),
                                    entry.residents
                                );
                            }
                        }
                        Err(err) => println!("Data integrity error: {err}"),
                    }
                });
            }

            10 => {
                let path = match prompt::<String>(&mut lines, "Destination path [perf_log.csv]: ")?
                {
                    Input::Value(path) => path,
                    Input::Invalid => {
                        println!("Invalid input.");
                        continue;
                    }
                    Input::Eof => break,
                };
                let path = if path.is_empty() {
                    "perf_log.csv".to_owned()
                } else {
                    path
                };
                match monitor.export_csv(Path::new(&path)) {
                    Ok(()) => println!("Wrote {path}."),
                    Err(err) => println!("Export failed: {err}"),
                }
            }

            11 => break,

            _ => println!("Invalid option."),
        }
    }

    println!("Bye.");
    Ok(())
}
