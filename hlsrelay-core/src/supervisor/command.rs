//! ffmpeg invocation for a relay run
//!
//! The input and HLS output arguments are fixed; the codec section comes from
//! the configured [`TranscodeMode`].

use crate::models::{EncodingParams, TranscodeMode};
use crate::supervisor::artifacts::OutputHousekeeper;
use crate::supervisor::process::RelayCommand;

/// Build the full ffmpeg command line.
#[must_use]
pub fn build_command(
    program: &str,
    source_url: &str,
    params: &EncodingParams,
    list_size: u32,
    output: &OutputHousekeeper,
) -> RelayCommand {
    let mut args: Vec<String> = Vec::with_capacity(64);

    args.extend(
        [
            "-hide_banner",
            "-loglevel",
            "warning",
            "-fflags",
            "+genpts+discardcorrupt",
            "-reconnect",
            "1",
            "-reconnect_streamed",
            "1",
            "-reconnect_delay_max",
            "5",
            "-i",
        ]
        .map(String::from),
    );
    args.push(source_url.to_string());

    args.extend(["-map", "0:v:0", "-map", "0:a:0?"].map(String::from));
    match params.mode {
        TranscodeMode::Reencode => push_reencode_args(&mut args, params),
        TranscodeMode::Copy => args.extend(["-c", "copy"].map(String::from)),
    }

    args.extend(["-f", "hls", "-hls_time"].map(String::from));
    args.push(params.hls_time.to_string());
    args.push("-hls_list_size".to_string());
    args.push(list_size.to_string());
    args.extend(
        [
            "-hls_flags",
            "append_list+independent_segments+program_date_time",
            "-hls_segment_type",
            "mpegts",
            "-hls_allow_cache",
            "1",
            "-hls_segment_filename",
        ]
        .map(String::from),
    );
    args.push(output.segment_template_path().to_string_lossy().into_owned());
    args.push(output.playlist_path().to_string_lossy().into_owned());

    RelayCommand {
        program: program.to_string(),
        args,
    }
}

fn push_reencode_args(args: &mut Vec<String>, params: &EncodingParams) {
    args.extend(["-c:v", "libx264", "-preset"].map(String::from));
    args.push(params.preset.clone());
    args.extend(
        [
            "-tune",
            "zerolatency",
            "-pix_fmt",
            "yuv420p",
            "-g",
            "48",
            "-keyint_min",
            "48",
            "-sc_threshold",
            "0",
            "-b:v",
        ]
        .map(String::from),
    );
    args.push(params.video_bitrate.clone());
    args.extend(["-c:a", "aac", "-b:a"].map(String::from));
    args.push(params.audio_bitrate.clone());
    args.extend(["-ac", "2", "-ar", "48000", "-threads"].map(String::from));
    args.push(params.threads.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RelayConfig, RelayProfile};

    fn value_after<'a>(cmd: &'a RelayCommand, flag: &str) -> Option<&'a str> {
        cmd.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| cmd.args.get(i + 1))
            .map(String::as_str)
    }

    #[test]
    fn test_reencode_command() {
        let cfg = RelayConfig {
            preset: "fast".to_string(),
            ffmpeg_threads: 4,
            ..Default::default()
        };
        let params = cfg.encoding();
        let output = OutputHousekeeper::new("/srv/out");
        let cmd = build_command("ffmpeg", "http://example.com/in.m3u8", &params, 30, &output);

        assert_eq!(cmd.program, "ffmpeg");
        assert_eq!(value_after(&cmd, "-i"), Some("http://example.com/in.m3u8"));
        assert_eq!(value_after(&cmd, "-c:v"), Some("libx264"));
        assert_eq!(value_after(&cmd, "-preset"), Some("fast"));
        assert_eq!(value_after(&cmd, "-b:v"), Some("2500k"));
        assert_eq!(value_after(&cmd, "-b:a"), Some("128k"));
        assert_eq!(value_after(&cmd, "-threads"), Some("4"));
        assert_eq!(value_after(&cmd, "-hls_time"), Some("4"));
        assert_eq!(value_after(&cmd, "-hls_list_size"), Some("30"));
        assert_eq!(
            value_after(&cmd, "-hls_segment_filename"),
            Some("/srv/out/live_%05d.ts")
        );
        assert_eq!(cmd.args.last().map(String::as_str), Some("/srv/out/live.m3u8"));
    }

    #[test]
    fn test_copy_command_skips_encoder_flags() {
        let cfg = RelayConfig {
            transcode_mode: TranscodeMode::Copy,
            ..Default::default()
        };
        let output = OutputHousekeeper::new("/srv/out");
        let cmd = build_command("ffmpeg", "http://example.com/in.m3u8", &cfg.encoding(), 15, &output);

        assert_eq!(value_after(&cmd, "-c"), Some("copy"));
        assert!(!cmd.args.iter().any(|a| a == "libx264" || a == "-b:v" || a == "-preset"));
        assert_eq!(value_after(&cmd, "-hls_list_size"), Some("15"));
        assert_eq!(value_after(&cmd, "-f"), Some("hls"));
    }
}
