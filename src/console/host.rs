/* src/console/host.rs */

use sysinfo::System;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadAverage {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
}

/// Host-wide figures for the stats panel. `None` means the value could not
/// be read this tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HostMetrics {
    pub memory_used_percent: Option<f64>,
    pub load: Option<LoadAverage>,
}

pub trait HostMetricsSource: Send {
    fn sample(&mut self) -> HostMetrics;
}

pub struct SysinfoHost {
    system: System,
}

impl SysinfoHost {
    pub fn new() -> Self {
        SysinfoHost {
            system: System::new(),
        }
    }
}

impl Default for SysinfoHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostMetricsSource for SysinfoHost {
    fn sample(&mut self) -> HostMetrics {
        self.system.refresh_memory();

        let total = self.system.total_memory();
        let memory_used_percent = if total == 0 {
            None
        } else {
            Some(self.system.used_memory() as f64 / total as f64 * 100.0)
        };

        // Platforms without a load average report zeros, which is what we show.
        let load = System::load_average();

        HostMetrics {
            memory_used_percent,
            load: Some(LoadAverage {
                one: load.one,
                five: load.five,
                fifteen: load.fifteen,
            }),
        }
    }
}
