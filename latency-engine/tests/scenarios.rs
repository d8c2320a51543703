use latency_engine::{
    arm_latency, disarm, testing::*, Action, BoardReset, CaptureDetector,
    CaptureSlot, CaptureTimer, Command, Dispatcher, EngineConfig,
    LevelMeasurement, Polarity, ProfileSelector, Report, RunMode, RunStatus,
    StimulusGenerator,
};

/// Activation delay used for all scenarios, in capture ticks.
const ACTIVATION: u16 = 2;

/// Noise filter delay used for all scenarios, in capture ticks.
const FILTER_DELAY: u16 = 1;

/// The engine on mock hardware. Interrupts and the main loop are driven by hand.
struct Bench {
    slot: &'static CaptureSlot,
    profiles: &'static ProfileSelector,
    config: EngineConfig,
    tick: MockTick,
    timer: MockCapture,
    generator: StimulusGenerator<MockPin>,
    dispatcher: Dispatcher<'static, MockPin, MockDelay, 2>,
    mode: RunMode,
    level: Option<LevelMeasurement>,
    reports: Vec<Report>,
}

impl Bench {
    fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    fn with_config(config: EngineConfig) -> Self {
        let slot: &'static CaptureSlot =
            Box::leak(Box::new(CaptureSlot::new()));
        let profiles: &'static ProfileSelector =
            Box::leak(Box::new(ProfileSelector::default()));
        let resets = BoardReset::new(
            [MockPin::default(), MockPin::default()],
            MockDelay::default(),
            config.board_count,
        )
        .unwrap();
        Self {
            slot,
            profiles,
            config,
            tick: MockTick::default(),
            timer: MockCapture::default(),
            generator: StimulusGenerator::new(
                MockPin::default(),
                config.capture_bias(ACTIVATION, FILTER_DELAY),
            )
            .unwrap(),
            dispatcher: Dispatcher::new(profiles, resets),
            mode: RunMode::new(),
            level: None,
            reports: Vec::new(),
        }
    }

    fn command(&mut self, byte: u8) {
        if let Some(report) = Command::parse(byte)
            .and_then(|command| self.dispatcher.handle(command, &mut self.mode))
        {
            self.reports.push(report);
        }
        self.main_loop();
    }

    fn main_loop(&mut self) {
        match self.mode.poll() {
            Some(Action::ArmLatency) => arm_latency(
                &mut self.tick,
                &mut self.timer,
                &mut self.generator,
                self.slot,
                self.config.capture_polarity,
            )
            .unwrap(),
            Some(Action::Disarm) => {
                if let Some(level) = self.level.take() {
                    level.cancel(&mut self.timer);
                }
                disarm(&mut self.tick, &mut self.timer, &mut self.generator)
                    .unwrap();
                self.reports.push(Report::Stopped);
            }
            Some(Action::EnterLevel) => {
                disarm(&mut self.tick, &mut self.timer, &mut self.generator)
                    .unwrap();
                self.level = Some(LevelMeasurement::start(&mut self.timer));
            }
            None => {}
        }
        if let Some(level) = self.level.as_mut() {
            if let Some(width) = level.poll(&mut self.timer) {
                self.reports.push(Report::Width(width));
            }
        }
        if self.slot.take_spurious() {
            self.reports.push(Report::Spurious);
        }
    }

    /// One base tick interrupt.
    fn base_tick(&mut self) {
        if !self.tick.listening {
            return;
        }
        if let Some(report) = self
            .generator
            .tick(self.profiles.active(), self.slot, &mut self.timer)
            .unwrap()
        {
            self.reports.push(report);
        }
    }

    fn base_ticks(&mut self, count: usize) {
        for _ in 0..count {
            self.base_tick();
        }
    }

    /// An edge `delay` capture ticks after the current counter value.
    fn edge(&mut self, polarity: Polarity, delay: u16) {
        self.timer.edge(polarity, delay);
        if self.timer.listening {
            let _ = CaptureDetector::new(self.slot).service(&mut self.timer);
        }
    }

    /// A response edge of the configured polarity.
    fn response(&mut self, delay: u16) {
        self.edge(self.config.capture_polarity, delay);
    }

    fn take_reports(&mut self) -> Vec<Report> {
        core::mem::take(&mut self.reports)
    }
}

#[test]
fn latency_is_reported_at_timeout() {
    let mut bench = Bench::new();
    bench.command(b's');
    assert_eq!(bench.mode.status(), RunStatus::LatencyRunning);
    assert_eq!(bench.take_reports(), [Report::StartingLatency]);

    // The first partial period times out at tick 20, the stimulus fires on
    // tick 25.
    bench.base_ticks(25);
    assert_eq!(bench.take_reports(), [Report::Timeout]);
    assert!(bench.slot.snapshot().fired);
    // The stimulus edge reaches the capture input after the activation delay.
    bench.response(ACTIVATION + 1 + 1234);
    bench.base_ticks(19);
    assert!(bench.take_reports().is_empty());
    bench.base_tick();
    assert_eq!(bench.take_reports(), [Report::Latency(1234)]);
}

#[test]
fn missing_response_times_out() {
    let mut bench = Bench::new();
    bench.command(b's');
    bench.take_reports();
    bench.base_ticks(75);
    // One timeout per period: after ticks 20, 45 and 70.
    assert_eq!(bench.take_reports(), [Report::Timeout; 3]);
    assert!(bench.slot.snapshot().fired);
    bench.base_ticks(20);
    assert_eq!(bench.take_reports(), [Report::Timeout]);
    assert!(!bench.slot.snapshot().fired);
}

#[test]
fn second_edge_is_spurious() {
    let mut bench = Bench::new();
    bench.command(b's');
    bench.base_ticks(25);
    bench.take_reports();
    bench.response(100);
    bench.response(100);
    bench.main_loop();
    assert_eq!(bench.take_reports(), [Report::Spurious]);
    bench.base_ticks(20);
    let reports = bench.take_reports();
    assert_eq!(reports.len(), 1);
    assert!(matches!(reports[0], Report::Latency(_)));
}

#[test]
fn edge_without_stimulus_is_spurious() {
    let mut bench = Bench::new();
    bench.command(b's');
    bench.take_reports();
    bench.response(5);
    bench.main_loop();
    assert_eq!(bench.take_reports(), [Report::Spurious]);
    assert!(!bench.slot.snapshot().data_ready);
    assert_eq!(bench.slot.snapshot().captured_ticks, 0);
}

#[test]
fn invalid_profile_is_rejected() {
    let mut bench = Bench::new();
    bench.command(b'1');
    bench.command(b'3');
    assert_eq!(
        bench.take_reports(),
        [
            Report::ProfileSelected {
                index: 1,
                name: "50Hz"
            },
            Report::InvalidSetting
        ]
    );
    assert_eq!(bench.profiles.active().name(), "50Hz");
}

#[test]
fn stop_disarms() {
    let mut bench = Bench::new();
    bench.command(b's');
    bench.base_ticks(25);
    bench.take_reports();

    bench.command(b'h');
    assert_eq!(bench.mode.status(), RunStatus::Stopped);
    assert!(!bench.tick.listening && !bench.timer.listening);
    assert_eq!(bench.take_reports(), [Report::Stopped]);

    bench.response(10);
    bench.base_ticks(50);
    bench.main_loop();
    assert!(bench.take_reports().is_empty());

    // Repeated stops are silent.
    bench.command(b'h');
    bench.command(b'h');
    assert!(bench.take_reports().is_empty());
    assert_eq!(bench.mode.status(), RunStatus::Stopped);
}

#[test]
fn level_measures_pulse_width() {
    let mut bench = Bench::new();
    bench.command(b'l');
    assert_eq!(bench.mode.status(), RunStatus::LevelRunning);
    assert_eq!(bench.take_reports(), [Report::StartingLevel]);
    assert!(!bench.tick.listening && !bench.timer.listening);

    bench.timer.preload(0xff00);
    bench.edge(Polarity::Falling, 0);
    bench.main_loop();
    bench.edge(Polarity::Rising, 0x180);
    bench.main_loop();
    assert_eq!(bench.take_reports(), [Report::Width(0x180)]);

    // A pulse still open when the stop is observed is not reported.
    bench.edge(Polarity::Falling, 0x10);
    bench.main_loop();
    bench.command(b'h');
    bench.edge(Polarity::Rising, 0x20);
    bench.main_loop();
    assert_eq!(bench.mode.status(), RunStatus::Stopped);
    assert_eq!(bench.take_reports(), [Report::Stopped]);
}

#[test]
fn stop_discards_latched_falling_edge() {
    let mut bench = Bench::new();
    bench.command(b'l');
    bench.edge(Polarity::Falling, 5);
    bench.command(b'h');
    assert_eq!(
        bench.take_reports(),
        [Report::StartingLevel, Report::Stopped]
    );

    // The next measurement waits for a new falling edge.
    bench.command(b'l');
    bench.edge(Polarity::Rising, 40);
    bench.main_loop();
    bench.edge(Polarity::Falling, 10);
    bench.main_loop();
    bench.edge(Polarity::Rising, 30);
    bench.main_loop();
    assert_eq!(
        bench.take_reports(),
        [Report::StartingLevel, Report::Width(30)]
    );
}

#[test]
fn rising_edge_variant() {
    let mut bench = Bench::with_config(EngineConfig {
        capture_polarity: Polarity::Rising,
        ..Default::default()
    });
    bench.command(b's');
    bench.base_ticks(25);
    bench.take_reports();

    // Falling edges are ignored.
    bench.edge(Polarity::Falling, ACTIVATION + 1 + 500);
    bench.main_loop();
    assert!(bench.take_reports().is_empty());
    bench.edge(Polarity::Rising, 100);
    bench.base_ticks(20);
    assert_eq!(bench.take_reports(), [Report::Latency(600)]);
}

#[test]
fn noise_canceler_variant() {
    let mut bench = Bench::with_config(EngineConfig {
        noise_canceler: true,
        ..Default::default()
    });
    bench.command(b's');
    bench.base_ticks(25);
    bench.take_reports();

    // The filter delay is compensated by the capture bias.
    bench.response(ACTIVATION + FILTER_DELAY + 1 + 1234);
    bench.base_ticks(20);
    assert_eq!(bench.take_reports(), [Report::Latency(1234)]);
}

#[test]
fn single_board_variant() {
    let mut bench = Bench::with_config(EngineConfig {
        board_count: 1,
        ..Default::default()
    });
    bench.command(b'r');
    bench.command(b't');
    assert_eq!(
        bench.take_reports(),
        [Report::Resetting(0), Report::InvalidBoard(1)]
    );
}
