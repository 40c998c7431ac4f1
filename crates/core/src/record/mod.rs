use std::{
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
};

use tracing::{debug, info};

use crate::{
    color::Rgb,
    config::RecordingSettings,
    render::FrameBuffer,
    OrbError, Result,
};

/// Flattens a rendered frame over `background` into packed 8-bit RGB.
pub fn composite_rgb8(frame: &FrameBuffer, background: Rgb) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(frame.pixels().len() * 3);
    for shade in frame.pixels() {
        let rgb = shade.over(background);
        bytes.extend([to_u8(rgb.r), to_u8(rgb.g), to_u8(rgb.b)]);
    }
    bytes
}

/// Writes a single frame as an RGB PNG.
pub fn write_png(path: impl AsRef<Path>, frame: &FrameBuffer, background: Rgb) -> Result<()> {
    if frame.width() == 0 || frame.height() == 0 {
        return Err(OrbError::InvalidInput("cannot encode an empty frame"));
    }

    let file = File::create(path.as_ref())?;
    let mut encoder = png::Encoder::new(BufWriter::new(file), frame.width(), frame.height());
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&composite_rgb8(frame, background))?;
    writer.finish()?;
    Ok(())
}

fn to_u8(channel: f32) -> u8 {
    (channel.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Writes numbered PNG frames into a directory for later encoding.
#[derive(Debug, Default)]
pub struct Recorder {
    settings: RecordingSettings,
    is_recording: bool,
    frames_written: u32,
}

impl Recorder {
    pub fn new(settings: RecordingSettings) -> Self {
        Self {
            settings,
            is_recording: false,
            frames_written: 0,
        }
    }

    pub fn settings(&self) -> &RecordingSettings {
        &self.settings
    }

    pub fn start(&mut self) -> Result<()> {
        fs::create_dir_all(&self.settings.output_dir)?;
        self.is_recording = true;
        self.frames_written = 0;
        info!(dir = %self.settings.output_dir, fps = self.settings.fps, "recording started");
        Ok(())
    }

    pub fn stop(&mut self) -> Result<()> {
        if self.is_recording {
            info!(frames = self.frames_written, "recording stopped");
        }
        self.is_recording = false;
        Ok(())
    }

    pub fn is_recording(&self) -> bool {
        self.is_recording
    }

    pub fn frames_written(&self) -> u32 {
        self.frames_written
    }

    pub fn frame_path(&self, index: u32) -> PathBuf {
        Path::new(&self.settings.output_dir).join(format!("frame_{index:05}.png"))
    }

    /// Writes the next frame and returns its path.
    pub fn write_frame(&mut self, frame: &FrameBuffer) -> Result<PathBuf> {
        if !self.is_recording {
            return Err(OrbError::NotRecording);
        }

        let path = self.frame_path(self.frames_written);
        write_png(&path, frame, self.settings.background)?;
        self.frames_written += 1;
        debug!(?path, "frame written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{render_frame, FrameInputs};

    fn settings(dir: &Path) -> RecordingSettings {
        RecordingSettings {
            output_dir: dir.join("frames").to_string_lossy().into_owned(),
            fps: 30,
            background: Rgb::BLACK,
        }
    }

    fn frame(width: u32, height: u32) -> FrameBuffer {
        let mut buffer = FrameBuffer::default();
        let inputs = FrameInputs {
            time: 1.0,
            width,
            height,
            ..FrameInputs::default()
        };
        render_frame(&inputs, &mut buffer);
        buffer
    }

    #[test]
    fn writing_before_start_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder = Recorder::new(settings(dir.path()));
        assert!(matches!(
            recorder.write_frame(&frame(4, 4)),
            Err(OrbError::NotRecording)
        ));
    }

    #[test]
    fn writes_numbered_pngs() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder = Recorder::new(settings(dir.path()));
        recorder.start().unwrap();
        assert!(recorder.is_recording());

        let first = recorder.write_frame(&frame(8, 6)).unwrap();
        let second = recorder.write_frame(&frame(8, 6)).unwrap();
        assert!(first.ends_with("frame_00000.png"));
        assert!(second.ends_with("frame_00001.png"));
        assert_eq!(recorder.frames_written(), 2);

        let decoder = png::Decoder::new(File::open(&second).unwrap());
        let reader = decoder.read_info().unwrap();
        assert_eq!((reader.info().width, reader.info().height), (8, 6));
        assert_eq!(reader.info().color_type, png::ColorType::Rgb);

        recorder.stop().unwrap();
        assert!(matches!(
            recorder.write_frame(&frame(8, 6)),
            Err(OrbError::NotRecording)
        ));
    }

    #[test]
    fn empty_frames_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder = Recorder::new(settings(dir.path()));
        recorder.start().unwrap();
        assert!(matches!(
            recorder.write_frame(&frame(0, 0)),
            Err(OrbError::InvalidInput(_))
        ));
    }

    #[test]
    fn transparent_pixels_show_the_background() {
        let background = Rgb::from_u8(10, 20, 30);
        let bytes = composite_rgb8(&FrameBuffer::new(2, 1), background);
        assert_eq!(bytes, vec![10, 20, 30, 10, 20, 30]);
    }
}
