mod test_attach_requires_host;
mod test_caller_header_required;
mod test_host_rejection_conflicts;
mod test_join_times_out_without_answer;
mod test_open_rooms_count_members;
mod test_profile_update;
