pub mod alpha_matting;
pub mod apply_alpha_mask;
pub mod background;
pub mod blur_fusion;
pub mod box_filter;
pub mod closed_form;
pub mod color;
pub mod morphology;
pub mod stack;
pub mod summed_area_table;
pub mod trimap;
