//! File discovery: which recordings still need converting.
//!
//! Everything here is a pure function of two directory listings, so running
//! discovery twice over unchanged directories yields the same todo set.

use std::path::Path;

use crate::config::ConversionRequest;
use crate::error::{ConvertError, Result};
use crate::job::{file_stem, ConversionJob, MediaKind, OUTPUT_EXTENSION};

/// Name used for an image bundle whose files share no prefix.
const FALLBACK_BUNDLE_NAME: &str = "images";

/// Sorted names of the non-hidden files in `dir` whose extension matches one
/// of `extensions` (case-insensitive, leading dot optional).
///
/// # Errors
///
/// [`ConvertError::Precondition`] if `dir` does not exist.
pub fn list_files(dir: &Path, extensions: &[&str]) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Err(ConvertError::Precondition(format!(
            "directory does not exist: {}",
            dir.display()
        )));
    }

    let wanted: Vec<String> = extensions
        .iter()
        .map(|e| e.trim_start_matches('.').to_lowercase())
        .collect();

    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            continue;
        }
        let matches = Path::new(&name)
            .extension()
            .map(|ext| wanted.contains(&ext.to_string_lossy().to_lowercase()))
            .unwrap_or(false);
        if matches {
            names.push(name);
        }
    }

    names.sort();
    Ok(names)
}

/// Longest common leading substring of `names`.
pub fn common_prefix<S: AsRef<str>>(names: &[S]) -> String {
    let Some(first) = names.first() else {
        return String::new();
    };
    let mut prefix: &str = first.as_ref();
    for name in &names[1..] {
        let name = name.as_ref();
        let shared = prefix
            .char_indices()
            .zip(name.chars())
            .take_while(|((_, a), b)| a == b)
            .last()
            .map(|((i, c), _)| i + c.len_utf8())
            .unwrap_or(0);
        prefix = &prefix[..shared];
    }
    prefix.to_string()
}

/// Output name (without extension) for a set of image files: the common
/// prefix of their stems, without trailing separators.
pub fn bundle_name<S: AsRef<str>>(names: &[S]) -> String {
    let stems: Vec<String> = names
        .iter()
        .map(|n| file_stem(Path::new(n.as_ref())))
        .collect();
    let prefix = common_prefix(&stems);
    let trimmed = prefix.trim_end_matches(&['_', '-', '.', ' '][..]);
    if trimmed.is_empty() {
        FALLBACK_BUNDLE_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Input files in `input_dir` that still need converting.
///
/// A video is done when `<stem>.mp4` exists in `output_dir`. Images are
/// all-or-nothing: if any output starts with the bundle name of the
/// candidate images, the whole set counts as converted.
pub fn todo_set(
    input_dir: &Path,
    output_dir: &Path,
    extension: &str,
    overwrite: bool,
) -> Result<Vec<String>> {
    let files = list_files(input_dir, &[extension])?;
    if overwrite {
        return Ok(files);
    }

    let done: Vec<String> = list_files(output_dir, &[OUTPUT_EXTENSION])?
        .iter()
        .map(|n| file_stem(Path::new(n)))
        .collect();

    let todo: Vec<String> = files
        .into_iter()
        .filter(|f| !done.contains(&file_stem(Path::new(f))))
        .collect();

    if MediaKind::from_extension(extension) == Some(MediaKind::Images) && !todo.is_empty() {
        let bundle = bundle_name(&todo);
        if done.iter().any(|stem| stem.starts_with(&bundle)) {
            return Ok(Vec::new());
        }
    }

    Ok(todo)
}

/// Build the jobs for one discovery pass.
pub fn discover_jobs(request: &ConversionRequest) -> Result<Vec<ConversionJob>> {
    let todo = todo_set(
        request.input_dir(),
        request.output_dir(),
        request.extension(),
        request.overwrite(),
    )?;

    tracing::debug!(
        "Found {} {} file(s) to convert in {:?}",
        todo.len(),
        request.extension(),
        request.input_dir()
    );

    if todo.is_empty() {
        return Ok(Vec::new());
    }

    let jobs = match request.kind() {
        MediaKind::Video => todo
            .iter()
            .map(|name| ConversionJob::video(request.input_dir().join(name), request.output_dir()))
            .collect(),
        MediaKind::Images => {
            let bundle = bundle_name(&todo);
            let inputs = todo
                .iter()
                .map(|name| request.input_dir().join(name))
                .collect();
            vec![ConversionJob::image_bundle(
                inputs,
                &bundle,
                request.output_dir(),
            )]
        }
    };

    Ok(jobs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConvertConfig;
    use std::fs;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"x").unwrap();
    }

    #[test]
    fn test_list_files_sorted_filtered() {
        let dir = tempdir().unwrap();
        for name in ["b.h264", "a.h264", ".hidden.h264", "notes.txt", "C.H264"] {
            touch(dir.path(), name);
        }
        fs::create_dir(dir.path().join("sub.h264")).unwrap();

        let files = list_files(dir.path(), &[".h264"]).unwrap();
        assert_eq!(files, vec!["C.H264", "a.h264", "b.h264"]);
    }

    #[test]
    fn test_list_files_missing_dir() {
        let err = list_files(Path::new("/nonexistent/recordings"), &["h264"]).unwrap_err();
        assert!(matches!(err, ConvertError::Precondition(_)));
    }

    #[test]
    fn test_common_prefix() {
        assert_eq!(common_prefix(&["img001.jpg", "img002.jpg", "img010.jpg"]), "img0");
        assert_eq!(common_prefix(&["only.jpg"]), "only.jpg");
        assert_eq!(common_prefix(&["abc", "xyz"]), "");
        assert_eq!(common_prefix::<&str>(&[]), "");
        assert_eq!(common_prefix(&["café1", "café2"]), "café");
    }

    #[test]
    fn test_bundle_name() {
        assert_eq!(bundle_name(&["cam1_001.jpg", "cam1_002.jpg"]), "cam1_00");
        assert_eq!(bundle_name(&["cam1_a.jpg", "cam1_b.jpg"]), "cam1");
        assert_eq!(bundle_name(&["a.jpg", "b.jpg"]), "images");
        assert_eq!(bundle_name(&["single.png"]), "single");
    }

    #[test]
    fn test_todo_set_skips_converted() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        touch(input.path(), "a.h264");
        touch(input.path(), "b.h264");
        touch(output.path(), "a.mp4");

        let todo = todo_set(input.path(), output.path(), ".h264", false).unwrap();
        assert_eq!(todo, vec!["b.h264"]);

        let all = todo_set(input.path(), output.path(), ".h264", true).unwrap();
        assert_eq!(all, vec!["a.h264", "b.h264"]);
    }

    #[test]
    fn test_todo_set_is_idempotent() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        for name in ["a.h264", "b.h264", "c.h264"] {
            touch(input.path(), name);
        }
        touch(output.path(), "b.mp4");

        let first = todo_set(input.path(), output.path(), ".h264", false).unwrap();
        let second = todo_set(input.path(), output.path(), ".h264", false).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, vec!["a.h264", "c.h264"]);
    }

    #[test]
    fn test_todo_set_same_directory() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "a.h264");
        touch(dir.path(), "a.mp4");
        touch(dir.path(), "b.h264");

        let todo = todo_set(dir.path(), dir.path(), ".h264", false).unwrap();
        assert_eq!(todo, vec!["b.h264"]);
    }

    #[test]
    fn test_image_bundle_already_converted() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        for i in 1..=10 {
            touch(input.path(), &format!("img{:03}.jpg", i));
        }

        let todo = todo_set(input.path(), output.path(), ".jpg", false).unwrap();
        assert_eq!(todo.len(), 10);

        touch(output.path(), "img0.mp4");
        let todo = todo_set(input.path(), output.path(), ".jpg", false).unwrap();
        assert!(todo.is_empty());

        let todo = todo_set(input.path(), output.path(), ".jpg", true).unwrap();
        assert_eq!(todo.len(), 10);
    }

    #[test]
    fn test_image_bundle_prefix_match_is_all_or_nothing() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        for name in ["img001.jpg", "img002.jpg"] {
            touch(input.path(), name);
        }
        touch(output.path(), "img00_day1.mp4");

        assert!(todo_set(input.path(), output.path(), ".jpg", false)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_discover_jobs_videos() {
        let input = tempdir().unwrap();
        let output = tempdir().unwrap();
        touch(input.path(), "a.h264");
        touch(input.path(), "b.h264");

        let request = ConversionRequest::from_config(&ConvertConfig {
            input_dir: Some(input.path().to_path_buf()),
            output_dir: Some(output.path().to_path_buf()),
            ..ConvertConfig::default()
        })
        .unwrap();

        let jobs = discover_jobs(&request).unwrap();
        let names: Vec<&str> = jobs.iter().map(|j| j.name()).collect();
        assert_eq!(names, vec!["a.h264", "b.h264"]);
        assert_eq!(jobs[0].output(), output.path().join("a.mp4"));
        assert_eq!(jobs[1].output(), output.path().join("b.mp4"));
    }

    #[test]
    fn test_discover_jobs_images_bundle() {
        let input = tempdir().unwrap();
        for name in ["cam2_0001.png", "cam2_0002.png", "cam2_0003.png"] {
            touch(input.path(), name);
        }

        let request = ConversionRequest::from_config(&ConvertConfig {
            input_dir: Some(input.path().to_path_buf()),
            extension: "png".into(),
            ..ConvertConfig::default()
        })
        .unwrap();

        let jobs = discover_jobs(&request).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].kind(), MediaKind::Images);
        assert_eq!(jobs[0].sources().len(), 3);
        assert_eq!(jobs[0].output(), input.path().join("cam2_000.mp4"));
    }
}
