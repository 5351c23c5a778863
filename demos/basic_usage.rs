//! Ejemplo básico de uso del simulador de taller automotriz.
//!
//! Corre una jornada corta con tiempo acelerado y muestra la estadística
//! final con recomendaciones.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use car_service_simulator::{config, report, Dispatcher, RequestGenerator, SimParams};

fn main() {
    println!("=== Ejemplo: Uso Básico del Simulador ===\n");

    // Tick acelerado: una jornada completa en un par de segundos reales
    let params = SimParams {
        window_ticks: 8_000, // 800 minutos simulados
        tick: Duration::from_micros(100),
        ..SimParams::default()
    };
    let tick = params.tick;

    let dispatcher = Arc::new(Dispatcher::new(
        params,
        config::default_station_configs(),
        2_025,
    ));
    dispatcher.start();

    let generator_handle = {
        let dispatcher = Arc::clone(&dispatcher);
        let mut generator = RequestGenerator::new(tick, 1, 2_025);
        thread::spawn(move || generator.run(&dispatcher))
    };

    while dispatcher.is_running() {
        thread::sleep(Duration::from_millis(300));
        println!("{}", report::progress_lines(&dispatcher));
    }

    generator_handle
        .join()
        .expect("el generador falló")
        .expect("todas las categorías están configuradas");
    dispatcher.join();

    println!("{}", report::full_report(&dispatcher));
    println!("✅ Ejemplo completado en {:.1} s.", dispatcher.elapsed().as_secs_f64());
}
