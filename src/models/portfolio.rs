use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::image_list::{is_image_extension, ImageList};

const GITHUB_PROFILE: &str = "https://github.com/Albertdmo13";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub label: String,
    pub url: String,
}

impl Link {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectCard {
    pub name: String,
    pub url: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct Section {
    /// Anchor used by the top bar pills.
    pub id: String,
    pub title: String,
    /// Short label for the top bar.
    pub nav_label: String,
    pub view_all: Option<Link>,
    pub images: ImageList,
    pub projects: Vec<ProjectCard>,
}

/// Everything shown on the page, top to bottom.
#[derive(Debug, Clone)]
pub struct Portfolio {
    pub banner: String,
    pub heading: String,
    pub tagline: String,
    pub links: Vec<Link>,
    pub sections: Vec<Section>,
}

fn showcase_section(number: u32, first_image: u32, repo: &str, project: &str) -> Section {
    let images = ImageList::new(
        (first_image..first_image + 4)
            .map(|seed| format!("https://picsum.photos/1200/480?random={seed}")),
    );
    let url = format!("{GITHUB_PROFILE}/{repo}");
    Section {
        id: format!("projects-{number}"),
        title: format!("Projects Section {number}"),
        nav_label: format!("Section {number}"),
        view_all: Some(Link::new(
            "View all",
            format!("{GITHUB_PROFILE}?tab=repositories"),
        )),
        images,
        projects: vec![
            ProjectCard {
                name: project.to_string(),
                url: url.clone(),
                description: "Description".to_string(),
            },
            ProjectCard {
                name: format!("{project} Plus"),
                url,
                description: "Description".to_string(),
            },
        ],
    }
}

impl Portfolio {
    /// The built-in demo page.
    pub fn showcase() -> Self {
        Self {
            banner: "Welcome to my portfolio".to_string(),
            heading: "Hi, I'm Albert".to_string(),
            tagline: "Test1.".to_string(),
            links: vec![
                Link::new("GitHub", GITHUB_PROFILE),
                Link::new("LinkedIn", "https://www.linkedin.com/in/tu-perfil"),
            ],
            sections: vec![
                showcase_section(1, 101, "PROJECT-1", "Project One"),
                showcase_section(2, 201, "PROJECT-2", "Project Two"),
            ],
        }
    }

    /// Builds a page from files and directories given on the command line.
    ///
    /// Each directory becomes one section of its images (not recursive,
    /// hidden entries skipped, sorted by path). Loose image files end up in
    /// a trailing "Selected images" section.
    pub fn from_paths(paths: &[PathBuf]) -> Result<Self> {
        let mut sections = Vec::new();
        let mut loose = Vec::new();

        for path in paths {
            if path.is_dir() {
                let images = collect_directory(path)
                    .with_context(|| format!("Failed to read directory {:?}", path))?;
                if images.is_empty() {
                    warn!("No images in {:?}, skipping", path);
                    continue;
                }
                let title = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                debug!("Section {:?} with {} images", title, images.len());
                sections.push(Section {
                    id: format!("section-{}", sections.len() + 1),
                    nav_label: title.clone(),
                    title,
                    view_all: None,
                    images: ImageList::from(images),
                    projects: Vec::new(),
                });
            } else if path.is_file() && has_image_extension(path) {
                loose.push(path_source(path));
            } else {
                warn!("Skipping {:?}: not an image or directory", path);
            }
        }

        if !loose.is_empty() {
            sections.push(Section {
                id: format!("section-{}", sections.len() + 1),
                title: "Selected images".to_string(),
                nav_label: "Selected".to_string(),
                view_all: None,
                images: ImageList::from(loose),
                projects: Vec::new(),
            });
        }

        if sections.is_empty() {
            bail!("No images found in {} path(s)", paths.len());
        }

        let total: usize = sections.iter().map(|s| s.images.len()).sum();
        info!("Loaded {} images in {} sections", total, sections.len());
        Ok(Self {
            banner: "Folio".to_string(),
            heading: "Local images".to_string(),
            tagline: format!("{total} images"),
            links: Vec::new(),
            sections,
        })
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(is_image_extension)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

fn path_source(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn collect_directory(dir: &Path) -> Result<Vec<String>> {
    let mut found = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() || is_hidden(path) || !has_image_extension(path) {
            continue;
        }
        found.push(path.to_path_buf());
    }
    found.sort();
    Ok(found.iter().map(|p| path_source(p)).collect())
}
