mod test_candidates_cross_before_answer;
mod test_glare_converges;
