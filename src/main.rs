use std::env;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use car_service_simulator::{config, report, Dispatcher, RequestGenerator, SimParams};

/// Opciones de línea de comandos del simulador.
#[derive(Debug)]
struct Options {
    /// Duración real de un tick, en microsegundos
    tick_us: u64,
    /// Días de calendario a generar
    days: u32,
    /// Semilla; por defecto se deriva del reloj
    seed: u64,
    /// Archivo donde persistir la estadística final
    output: Option<String>,
}

/// Parseo de CLI: `[--tick-us N] [--dias N] [--seed N] [--salida ARCHIVO]`
fn parse_options(args: &[String]) -> Result<Options, String> {
    let mut options = Options {
        tick_us: 1_000,
        days: 7,
        seed: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0),
        output: None,
    };

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        i += 1;
        let value = args
            .get(i)
            .ok_or_else(|| format!("Falta el valor para {}", flag))?;
        match flag {
            "--tick-us" => {
                options.tick_us = value
                    .parse()
                    .map_err(|_| format!("Valor inválido para --tick-us: {}", value))?;
                if options.tick_us == 0 {
                    return Err("--tick-us debe ser > 0".to_string());
                }
            }
            "--dias" => {
                options.days = value
                    .parse()
                    .map_err(|_| format!("Valor inválido para --dias: {}", value))?;
                if options.days == 0 {
                    return Err("--dias debe ser > 0".to_string());
                }
            }
            "--seed" => {
                options.seed = value
                    .parse()
                    .map_err(|_| format!("Valor inválido para --seed: {}", value))?;
            }
            "--salida" => {
                options.output = Some(value.clone());
            }
            other => return Err(format!("Opción desconocida: {}", other)),
        }
        i += 1;
    }

    Ok(options)
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let options = parse_options(&args).unwrap_or_else(|e| {
        eprintln!(
            "Uso:\n  {} [--tick-us N] [--dias N] [--seed N] [--salida ARCHIVO]\nError: {}",
            args.first().map(String::as_str).unwrap_or("bin"),
            e
        );
        std::process::exit(1);
    });

    let params = SimParams {
        tick: Duration::from_micros(options.tick_us),
        ..SimParams::default()
    };
    let tick = params.tick;

    println!("=== Simulador de taller automotriz ===");
    println!(
        "Ventana: {} min. simulados ⚯ tick: {} µs ⚯ semilla: {}",
        params.window_ticks / config::TICKS_PER_MINUTE,
        options.tick_us,
        options.seed
    );

    // El despachador se construye una vez y se comparte por referencia
    let dispatcher = Arc::new(Dispatcher::new(
        params,
        config::default_station_configs(),
        options.seed,
    ));
    dispatcher.start();

    // Generador de llegadas en su propio hilo
    let generator_handle = {
        let dispatcher = Arc::clone(&dispatcher);
        let mut generator = RequestGenerator::new(tick, options.days, options.seed);
        thread::spawn(move || generator.run(&dispatcher))
    };

    // Despliegue periódico del progreso mientras dure la generación
    while dispatcher.is_running() {
        thread::sleep(Duration::from_secs(2));
        println!("\n{}", report::progress_lines(&dispatcher));
    }

    generator_handle
        .join()
        .expect("el generador falló")
        .unwrap_or_else(|e| {
            eprintln!("Error de enrutamiento: {}", e);
            std::process::exit(1);
        });

    println!("\n[TALLER] generación terminada; las estaciones drenan su ventana...");
    dispatcher.join();

    let full = report::full_report(&dispatcher);
    println!("{}", full);

    if let Some(path) = &options.output {
        report::write_report(path, &full).unwrap_or_else(|e| {
            eprintln!("No se pudo escribir {}: {}", path, e);
            std::process::exit(1);
        });
        println!("📁 Estadística persistida en: {}", path);
    }

    println!(
        "\nDuración real de la corrida: {:.1} s.",
        dispatcher.elapsed().as_secs_f64()
    );
}
