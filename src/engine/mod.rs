//! Synthesis driver.
//!
//! Loads the model once, then synthesizes and persists each job of a
//! run plan strictly in sequence.

mod driver;

pub use driver::{DriverError, JobOutcome, RunReport, SynthesisDriver, load_and_run};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{self, Waveform};
    use crate::backend::{
        BackendError, GenerationOptions, MockModelProvider, MockSpeechModel, SpeechModel,
    };
    use crate::cli::Device;
    use crate::plan::SynthesisPlan;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    const SR: u32 = 24_000;

    fn write_prompt(path: &Path) {
        audio::save_wav(path, &[0.1, -0.1, 0.2, -0.2], 16_000).unwrap();
    }

    fn model_returning(samples: Vec<f32>, sample_rate: u32) -> MockSpeechModel {
        let mut model = MockSpeechModel::new();
        model.expect_sample_rate().return_const(SR);
        model
            .expect_generate()
            .returning(move |_| Ok(Waveform::new(samples.clone(), sample_rate)));
        model
    }

    fn idle_model() -> MockSpeechModel {
        let mut model = MockSpeechModel::new();
        model.expect_sample_rate().return_const(SR);
        model.expect_generate().never();
        model
    }

    fn driver(model: MockSpeechModel) -> SynthesisDriver {
        SynthesisDriver::from_model(Box::new(model))
    }

    // ===========================================
    // load
    // ===========================================

    #[test]
    fn test_load_binds_model() {
        let mut provider = MockModelProvider::new();
        provider
            .expect_load()
            .with(mockall::predicate::eq(Device::Mps))
            .times(1)
            .return_once(|_| Ok(Box::new(idle_model()) as Box<dyn SpeechModel>));

        let driver = SynthesisDriver::load(&provider, Device::Mps).unwrap();

        assert_eq!(driver.sample_rate(), SR);
    }

    #[test]
    fn test_load_failure_is_model_load_error() {
        let mut provider = MockModelProvider::new();
        provider.expect_load().times(1).returning(|_| {
            Err(BackendError::DeviceUnavailable(
                "CUDA not available".to_string(),
            ))
        });

        let result = SynthesisDriver::load(&provider, Device::Cuda);

        match result {
            Err(DriverError::ModelLoad { device, source }) => {
                assert_eq!(device, "cuda");
                assert!(matches!(source, BackendError::DeviceUnavailable(_)));
            }
            _ => panic!("expected ModelLoad error"),
        }
    }

    // ===========================================
    // synthesize
    // ===========================================

    #[test]
    fn test_synthesize_without_prompt() {
        let driver = driver(model_returning(vec![0.1; 480], SR));

        let waveform = driver
            .synthesize("Hello", None, &GenerationOptions::default())
            .unwrap();

        assert_eq!(waveform.len(), 480);
        assert_eq!(waveform.sample_rate, SR);
    }

    #[test]
    fn test_synthesize_passes_prompt_and_options() {
        let temp_dir = TempDir::new().unwrap();
        let prompt = temp_dir.path().join("sample.wav");
        write_prompt(&prompt);

        let expected_prompt = prompt.clone();
        let mut model = MockSpeechModel::new();
        model.expect_sample_rate().return_const(SR);
        model
            .expect_generate()
            .withf(move |req| {
                req.text == "Hello"
                    && req.audio_prompt.as_deref() == Some(expected_prompt.as_path())
                    && req.options.exaggeration == 1.5
            })
            .times(1)
            .returning(|_| Ok(Waveform::new(vec![0.2; 10], SR)));

        let options = GenerationOptions {
            exaggeration: 1.5,
            ..Default::default()
        };
        let result = driver(model).synthesize("Hello", Some(&prompt), &options);

        assert!(result.is_ok());
    }

    #[test]
    fn test_synthesize_empty_text() {
        let driver = driver(idle_model());

        let result = driver.synthesize("   ", None, &GenerationOptions::default());

        assert!(matches!(result, Err(DriverError::Synthesis(_))));
    }

    #[test]
    fn test_synthesize_invalid_options() {
        let driver = driver(idle_model());
        let options = GenerationOptions {
            cfg_weight: 3.0,
            ..Default::default()
        };

        let result = driver.synthesize("Hello", None, &options);

        assert!(matches!(result, Err(DriverError::Synthesis(_))));
    }

    #[test]
    fn test_synthesize_missing_prompt() {
        let driver = driver(idle_model());
        let prompt = PathBuf::from("/nonexistent/sample.wav");

        let result = driver.synthesize("Hello", Some(&prompt), &GenerationOptions::default());

        match result {
            Err(DriverError::AudioPrompt { path, .. }) => assert_eq!(path, prompt),
            _ => panic!("expected AudioPrompt error"),
        }
    }

    #[test]
    fn test_synthesize_corrupt_prompt() {
        let temp_dir = TempDir::new().unwrap();
        let prompt = temp_dir.path().join("sample.wav");
        std::fs::write(&prompt, b"RIFF fake wav data").unwrap();
        let driver = driver(idle_model());

        let result = driver.synthesize("Hello", Some(&prompt), &GenerationOptions::default());

        assert!(matches!(result, Err(DriverError::AudioPrompt { .. })));
    }

    #[test]
    fn test_synthesize_prompt_rejected_by_server() {
        let temp_dir = TempDir::new().unwrap();
        let prompt = temp_dir.path().join("sample.wav");
        write_prompt(&prompt);

        let mut model = MockSpeechModel::new();
        model.expect_sample_rate().return_const(SR);
        model
            .expect_generate()
            .times(1)
            .returning(|_| Err(BackendError::InvalidAudio("too short".to_string())));

        let result =
            driver(model).synthesize("Hello", Some(&prompt), &GenerationOptions::default());

        assert!(matches!(result, Err(DriverError::AudioPrompt { .. })));
    }

    #[test]
    fn test_synthesize_backend_failure() {
        let mut model = MockSpeechModel::new();
        model.expect_sample_rate().return_const(SR);
        model
            .expect_generate()
            .times(1)
            .returning(|_| Err(BackendError::RequestFailed("Status: 500".to_string())));

        let result = driver(model).synthesize("Hello", None, &GenerationOptions::default());

        assert!(matches!(result, Err(DriverError::Synthesis(_))));
    }

    #[test]
    fn test_synthesize_empty_waveform() {
        let driver = driver(model_returning(Vec::new(), SR));

        let result = driver.synthesize("Hello", None, &GenerationOptions::default());

        assert!(matches!(result, Err(DriverError::Synthesis(_))));
    }

    #[test]
    fn test_synthesize_sample_rate_mismatch() {
        let driver = driver(model_returning(vec![0.1; 10], 16_000));

        let result = driver.synthesize("Hello", None, &GenerationOptions::default());

        assert!(matches!(result, Err(DriverError::Synthesis(_))));
    }

    // ===========================================
    // persist
    // ===========================================

    #[test]
    fn test_persist_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("out.wav");
        let driver = driver(idle_model());
        let waveform = Waveform::new(vec![0.25, -0.25, 0.5], SR);

        driver.persist(&waveform, &output).unwrap();

        let read_back = audio::read_wav(&output).unwrap();
        assert_eq!(read_back, waveform);
    }

    #[test]
    fn test_persist_unwritable_path() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("missing").join("out.wav");
        let driver = driver(idle_model());

        let result = driver.persist(&Waveform::new(vec![0.1], SR), &output);

        match result {
            Err(DriverError::Io { path, .. }) => assert_eq!(path, output),
            _ => panic!("expected Io error"),
        }
    }

    // ===========================================
    // run
    // ===========================================

    #[test]
    fn test_run_writes_each_file_before_next_request() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().to_path_buf();
        write_prompt(&dir.join("sample.wav"));
        write_prompt(&dir.join("dad_sample.wav"));

        let plan = SynthesisPlan::demo("Hello")
            .with_prompt_dir(&dir)
            .with_output_dir(&dir);
        let outputs: Vec<PathBuf> = plan.jobs.iter().map(|j| j.output.clone()).collect();

        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let mut model = MockSpeechModel::new();
        model.expect_sample_rate().return_const(SR);
        model.expect_generate().times(3).returning(move |_| {
            let call = seen.fetch_add(1, Ordering::SeqCst);
            for (index, output) in outputs.iter().enumerate() {
                assert_eq!(output.exists(), index < call);
            }
            Ok(Waveform::new(vec![0.1 * (call + 1) as f32; 100], SR))
        });

        let report = driver(model).run(&plan).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(report.sample_rate, SR);
        assert_eq!(report.outputs.len(), 3);
        assert_eq!(report.outputs[1].audio_prompt, Some(dir.join("sample.wav")));
        for outcome in &report.outputs {
            assert!(outcome.output.exists());
            assert_eq!(outcome.samples, 100);
        }
    }

    #[test]
    fn test_run_aborts_on_first_failure() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().to_path_buf();
        // sample.wav is missing; dad_sample.wav exists
        write_prompt(&dir.join("dad_sample.wav"));

        let plan = SynthesisPlan::demo("Hello")
            .with_prompt_dir(&dir)
            .with_output_dir(&dir);

        let mut model = MockSpeechModel::new();
        model.expect_sample_rate().return_const(SR);
        model
            .expect_generate()
            .times(1)
            .returning(|_| Ok(Waveform::new(vec![0.1; 100], SR)));

        let result = driver(model).run(&plan);

        assert!(matches!(result, Err(DriverError::AudioPrompt { .. })));
        assert!(dir.join("test-1.wav").exists());
        assert!(!dir.join("test-2.wav").exists());
        assert!(!dir.join("test-3.wav").exists());
    }

    #[test]
    fn test_run_empty_text_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let plan = SynthesisPlan::demo("").with_output_dir(temp_dir.path());

        let result = driver(idle_model()).run(&plan);

        assert!(matches!(result, Err(DriverError::Synthesis(_))));
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_load_and_run_load_failure_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().to_path_buf();
        write_prompt(&dir.join("sample.wav"));
        write_prompt(&dir.join("dad_sample.wav"));
        let plan = SynthesisPlan::demo("Hello")
            .with_prompt_dir(&dir)
            .with_output_dir(&dir);

        let mut provider = MockModelProvider::new();
        provider
            .expect_load()
            .times(1)
            .returning(|_| Err(BackendError::ConnectionFailed("refused".to_string())));

        let result = load_and_run(&provider, Device::Cuda, &plan);

        assert!(matches!(result, Err(DriverError::ModelLoad { .. })));
        for job in &plan.jobs {
            assert!(!job.output.exists());
        }
    }

    #[test]
    fn test_run_empty_plan() {
        let report = driver(idle_model()).run(&SynthesisPlan::new("Hello")).unwrap();
        assert!(report.outputs.is_empty());
    }
}
