use tensorbridge_core::{
    classify, map_row, tensor_value, Channel, ChannelSource, NormalizationRange, OutputLayout, Row,
};

fn input_row(x: i32, r: i32, value: f32) -> Row {
    let mut row = Row::new(x, r);
    for channel in [Channel::Red, Channel::Green, Channel::Blue, Channel::Alpha] {
        row.writable(&channel).fill(value);
    }
    row.writable(&Channel::Named("depth.Z".into())).fill(value);
    row
}

#[test]
fn raw_values_are_returned_unchanged_without_normalization() {
    let tensor = [0.0, 0.5, 1.0, 2.0];
    let layout = OutputLayout::new(2, 2, 1);

    assert_eq!(tensor_value(&tensor, &layout, 0, 0, 0, None), 0.0);
    assert_eq!(tensor_value(&tensor, &layout, 1, 0, 0, None), 0.5);
    assert_eq!(tensor_value(&tensor, &layout, 0, 1, 0, None), 1.0);
    assert_eq!(tensor_value(&tensor, &layout, 1, 1, 0, None), 2.0);
}

#[test]
fn out_of_range_and_non_finite_reads_are_zero() {
    let tensor = [f32::NAN, 1.0, 2.0];
    let layout = OutputLayout::new(2, 2, 1);
    let range = Some(NormalizationRange { min: -1.0, max: 1.0 });

    assert_eq!(tensor_value(&tensor, &layout, 0, 0, 0, range), 0.0);
    assert_eq!(tensor_value(&tensor, &layout, -1, 0, 0, None), 0.0);
    assert_eq!(tensor_value(&tensor, &layout, 2, 0, 0, None), 0.0);
    // index 3 is past the buffer
    assert_eq!(tensor_value(&tensor, &layout, 1, 1, 0, None), 0.0);
    assert_eq!(tensor_value(&tensor, &layout, 1, 0, 0, range), 1.0);
}

#[test]
fn multi_channel_reads_select_the_plane() {
    let tensor = [1.0, 2.0, 10.0, 20.0];
    let layout = OutputLayout::new(2, 1, 2);
    assert_eq!(tensor_value(&tensor, &layout, 1, 0, 1, None), 20.0);
    assert_eq!(tensor_value(&tensor, &layout, 0, 0, 5, None), 0.0);
}

#[test]
fn single_channel_fills_red_and_clears_green_blue() {
    let tensor = [3.0, 4.0, 5.0, 6.0];
    let layout = OutputLayout::new(2, 2, 1);
    let channels = [Channel::Red, Channel::Green, Channel::Blue, Channel::Alpha];
    let input = input_row(0, 2, 7.0);
    let mut out = Row::new(0, 2);

    map_row(&tensor, &layout, None, 1, 0, 2, &channels, &input, &mut out);

    assert_eq!(out.get(&Channel::Red), Some(&[5.0, 6.0][..]));
    assert_eq!(out.get(&Channel::Green), Some(&[0.0, 0.0][..]));
    assert_eq!(out.get(&Channel::Blue), Some(&[0.0, 0.0][..]));
    assert_eq!(out.get(&Channel::Alpha), Some(&[7.0, 7.0][..]));
}

#[test]
fn two_channel_output_passes_alpha_and_blue_through() {
    let tensor = [1.0, 1.0, 2.0, 2.0];
    let layout = OutputLayout::new(2, 1, 2);
    let channels = [Channel::Red, Channel::Green, Channel::Blue, Channel::Alpha];
    let input = input_row(0, 2, 0.75);
    let mut out = Row::new(0, 2);

    map_row(&tensor, &layout, None, 0, 0, 2, &channels, &input, &mut out);

    assert_eq!(out.get(&Channel::Red), Some(&[1.0, 1.0][..]));
    assert_eq!(out.get(&Channel::Green), Some(&[2.0, 2.0][..]));
    assert_eq!(out.get(&Channel::Blue), Some(&[0.75, 0.75][..]));
    assert_eq!(out.get(&Channel::Alpha), Some(&[0.75, 0.75][..]));
}

#[test]
fn custom_channels_follow_their_component() {
    let layout = OutputLayout::new(1, 1, 3);
    let motion_y = Channel::Named("motion.y".into());
    let mask_a = Channel::Named("mask.a".into());
    let depth = Channel::Named("depth.Z".into());

    assert_eq!(classify(&motion_y, &layout), ChannelSource::Tensor(1));
    assert_eq!(classify(&mask_a, &layout), ChannelSource::Zero);
    assert_eq!(classify(&depth, &layout), ChannelSource::Zero);

    let tensor = [1.0, 2.0, 3.0];
    let input = input_row(0, 1, 9.0);
    let mut out = Row::new(0, 1);
    map_row(
        &tensor,
        &layout,
        None,
        0,
        0,
        1,
        &[motion_y.clone(), depth.clone()],
        &input,
        &mut out,
    );
    assert_eq!(out.get(&motion_y), Some(&[2.0][..]));
    assert_eq!(out.get(&depth), Some(&[0.0][..]));
}

#[test]
fn single_channel_custom_component_zero_reads_the_only_plane() {
    let layout = OutputLayout::new(1, 1, 1);
    assert_eq!(
        classify(&Channel::Named("disp.x".into()), &layout),
        ChannelSource::Tensor(0)
    );
    assert_eq!(
        classify(&Channel::Named("disp.y".into()), &layout),
        ChannelSource::Zero
    );
}

#[test]
fn rows_outside_the_output_come_from_input() {
    let tensor = [1.0; 4];
    let layout = OutputLayout::new(2, 2, 1);
    let input = input_row(0, 2, 0.5);
    let mut out = Row::new(0, 2);

    map_row(&tensor, &layout, None, 2, 0, 2, &[Channel::Red, Channel::Green], &input, &mut out);
    assert_eq!(out.get(&Channel::Red), Some(&[0.5, 0.5][..]));
    assert_eq!(out.get(&Channel::Green), Some(&[0.5, 0.5][..]));

    map_row(&tensor, &layout, None, -1, 0, 2, &[Channel::Red], &input, &mut out);
    assert_eq!(out.get(&Channel::Red), Some(&[0.5, 0.5][..]));
}

#[test]
fn columns_past_output_width_are_zero_and_normalization_applies() {
    let tensor = [0.0, 4.0];
    let layout = OutputLayout::new(2, 1, 1);
    let range = Some(NormalizationRange { min: 0.0, max: 4.0 });
    let input = input_row(0, 4, 0.5);
    let mut out = Row::new(0, 4);

    map_row(&tensor, &layout, range, 0, 0, 4, &[Channel::Red], &input, &mut out);
    assert_eq!(out.get(&Channel::Red), Some(&[0.0, 1.0, 0.0, 0.0][..]));
}

#[test]
fn pass_through_channels_cover_columns_past_output_width() {
    let tensor = [1.0, 2.0];
    let layout = OutputLayout::new(2, 1, 1);
    let input = input_row(0, 4, 0.5);
    let mut out = Row::new(0, 4);
    let channels = [Channel::Red, Channel::Green, Channel::Alpha];

    map_row(&tensor, &layout, None, 0, 0, 4, &channels, &input, &mut out);
    assert_eq!(out.get(&Channel::Red), Some(&[1.0, 2.0, 0.0, 0.0][..]));
    assert_eq!(out.get(&Channel::Green), Some(&[0.0; 4][..]));
    assert_eq!(out.get(&Channel::Alpha), Some(&[0.5; 4][..]));

    let layout = OutputLayout::new(2, 1, 2);
    let tensor = [1.0, 2.0, 3.0, 4.0];
    let channels = [Channel::Green, Channel::Blue];
    map_row(&tensor, &layout, None, 0, 0, 4, &channels, &input, &mut out);
    assert_eq!(out.get(&Channel::Green), Some(&[3.0, 4.0, 0.0, 0.0][..]));
    assert_eq!(out.get(&Channel::Blue), Some(&[0.5; 4][..]));
}

#[test]
fn writes_stay_inside_the_requested_columns() {
    let tensor = [1.0, 2.0, 3.0, 4.0];
    let layout = OutputLayout::new(4, 1, 1);
    let input = input_row(0, 4, 0.0);
    let mut out = Row::new(0, 4);
    out.writable(&Channel::Red).fill(-1.0);

    map_row(&tensor, &layout, None, 0, 1, 3, &[Channel::Red], &input, &mut out);
    assert_eq!(out.get(&Channel::Red), Some(&[-1.0, 2.0, 3.0, -1.0][..]));
}
